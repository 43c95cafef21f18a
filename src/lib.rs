//! lzw-huffman: Huffman coding, LZW, and the two composed.
//!
//! Three methods share one bit-packing scheme (see [`bitstream`]):
//! - Huffman coding over bytes
//! - LZW with the dictionary rebuilt on decode
//! - LZW codes fed into Huffman as an integer alphabet
//!
//! [`Compressor`] wraps them and records, next to each payload, what the
//! decoder needs (the Huffman frequency table or the LZW code width), so a
//! [`CompressedOutput`] can be serialized and decoded on its own.

pub mod bitstream;
pub mod config;
pub mod error;
pub mod files;
pub mod huffman;
pub mod lzw;
pub mod pipeline;

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::config::CodecConfig;
use crate::error::CompressError;
use crate::huffman::{CodeTable, FrequencyTable};
use crate::lzw::CodeWidthStrategy;

/// Compression method selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionMethod {
    Huffman,
    Lzw,
    LzwHuffman,
}

impl CompressionMethod {
    pub const ALL: [CompressionMethod; 3] = [
        CompressionMethod::Huffman,
        CompressionMethod::Lzw,
        CompressionMethod::LzwHuffman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMethod::Huffman => "huffman",
            CompressionMethod::Lzw => "lzw",
            CompressionMethod::LzwHuffman => "lzw-huffman",
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMethod {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| CompressError::ConfigError(format!("unknown compression method {:?}", s)))
    }
}

/// Decoder state that the payload itself does not carry
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CodecState {
    Huffman {
        frequencies: FrequencyTable<u8>,
    },
    Lzw {
        strategy: CodeWidthStrategy,
        code_width: u32,
    },
    LzwHuffman {
        frequencies: FrequencyTable<u32>,
    },
}

/// Compressed output container
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompressedOutput {
    pub method: CompressionMethod,
    pub original_size: usize,
    pub compressed_size: usize,
    pub data: Vec<u8>,
    pub ratio: f64,
    pub state: CodecState,
    pub metadata: CompressionMetadata,
}

impl CompressedOutput {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CompressError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CompressError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Metadata about the compression process
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompressionMetadata {
    pub entropy_bits: f64,
    /// Distinct Huffman symbols; zero for plain LZW.
    pub distinct_symbols: usize,
    /// Final LZW dictionary size; zero for plain Huffman.
    pub dictionary_size: usize,
}

/// The main compressor engine
pub struct Compressor {
    config: CodecConfig,
}

impl Compressor {
    /// Create a new compressor with the given configuration
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Compress data using the given method
    pub fn compress(&self, data: &[u8], method: CompressionMethod) -> Result<CompressedOutput, CompressError> {
        if data.len() > self.config.max_input_size {
            return Err(CompressError::InputTooLarge {
                size: data.len(),
                limit: self.config.max_input_size,
            });
        }

        let (compressed, state, distinct_symbols, dictionary_size) = match method {
            CompressionMethod::Huffman => {
                let encoded = huffman::compress(data)?;
                let distinct = encoded.table.len();
                let state = CodecState::Huffman {
                    frequencies: encoded.frequencies,
                };
                (encoded.data, state, distinct, 0)
            }
            CompressionMethod::Lzw => {
                let strategy = self.config.lzw_code_width;
                let encoded = lzw::compress(data, strategy)?;
                let state = CodecState::Lzw {
                    strategy,
                    code_width: encoded.code_width,
                };
                (encoded.data, state, 0, encoded.dictionary_size)
            }
            CompressionMethod::LzwHuffman => {
                let encoded = pipeline::compress(data)?;
                let distinct = encoded.table.len();
                // every code but the final flush added one entry
                let dictionary_size =
                    lzw::SEED_CODES as usize + encoded.frequencies.total().saturating_sub(1) as usize;
                let state = CodecState::LzwHuffman {
                    frequencies: encoded.frequencies,
                };
                (encoded.data, state, distinct, dictionary_size)
            }
        };

        let ratio = if data.is_empty() {
            1.0
        } else {
            compressed.len() as f64 / data.len() as f64
        };

        debug!(
            %method,
            original = data.len(),
            compressed = compressed.len(),
            ratio,
            "compressed"
        );

        Ok(CompressedOutput {
            method,
            original_size: data.len(),
            compressed_size: compressed.len(),
            data: compressed,
            ratio,
            state,
            metadata: CompressionMetadata {
                entropy_bits: compute_entropy(data),
                distinct_symbols,
                dictionary_size,
            },
        })
    }

    /// Decompress data
    pub fn decompress(&self, output: &CompressedOutput) -> Result<Vec<u8>, CompressError> {
        self.decompress_payload(output.method, &output.data, &output.state, output.original_size)
    }

    /// Decode a bare payload with the state recorded when it was compressed.
    pub fn decompress_payload(
        &self,
        method: CompressionMethod,
        data: &[u8],
        state: &CodecState,
        original_size: usize,
    ) -> Result<Vec<u8>, CompressError> {
        let decompressed = match (method, state) {
            (CompressionMethod::Huffman, CodecState::Huffman { frequencies }) => {
                huffman::decompress(data, &CodeTable::from_frequencies(frequencies)?)?
            }
            (CompressionMethod::Lzw, CodecState::Lzw { strategy, code_width }) => match strategy {
                CodeWidthStrategy::FixedFinal => lzw::decompress_with_width(data, *code_width)?,
                CodeWidthStrategy::Growing => lzw::decompress(data, *strategy)?,
            },
            (CompressionMethod::LzwHuffman, CodecState::LzwHuffman { frequencies }) => {
                pipeline::decompress_with_frequencies(data, frequencies)?
            }
            (method, _) => {
                return Err(CompressError::ConfigError(format!(
                    "codec state does not belong to method {}",
                    method
                )))
            }
        };

        if decompressed.len() != original_size {
            warn!(
                expected = original_size,
                actual = decompressed.len(),
                "decompressed size mismatch"
            );
            return Err(CompressError::SizeMismatch {
                expected: original_size,
                actual: decompressed.len(),
            });
        }
        Ok(decompressed)
    }
}

impl Default for Compressor {
    /// Create a compressor with default configuration
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

/// Compute Shannon entropy of data in bits per byte
pub fn compute_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut freq = [0u64; 256];
    for &b in data {
        freq[b as usize] += 1;
    }
    let len = data.len() as f64;
    let mut entropy = 0.0;
    for &f in &freq {
        if f > 0 {
            let p = f as f64 / len;
            entropy -= p * p.log2();
        }
    }
    entropy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_huffman() {
        let compressor = Compressor::default();
        let data = b"hello world hello world hello world";
        let result = compressor.compress(data, CompressionMethod::Huffman).unwrap();
        assert!(result.compressed_size > 0);
        assert_eq!(result.original_size, data.len());
        assert_eq!(result.method, CompressionMethod::Huffman);
        assert_eq!(result.metadata.distinct_symbols, 8);
    }

    #[test]
    fn test_compress_lzw_records_width() {
        let compressor = Compressor::default();
        let data = b"repeated repeated repeated repeated";
        let result = compressor.compress(data, CompressionMethod::Lzw).unwrap();
        match result.state {
            CodecState::Lzw { strategy, code_width } => {
                assert_eq!(strategy, CodeWidthStrategy::FixedFinal);
                assert_eq!(code_width, 9);
            }
            ref other => panic!("unexpected state {:?}", other),
        }
        assert!(result.metadata.dictionary_size > 256);
    }

    #[test]
    fn test_compress_empty_roundtrips() {
        let compressor = Compressor::default();
        for method in CompressionMethod::ALL {
            let result = compressor.compress(b"", method).unwrap();
            assert_eq!(result.ratio, 1.0);
            assert!(compressor.decompress(&result).unwrap().is_empty());
        }
    }

    #[test]
    fn test_roundtrip_all_methods() {
        let compressor = Compressor::default();
        let data = b"the quick brown fox jumps over the lazy dog";
        for method in CompressionMethod::ALL {
            let compressed = compressor.compress(data, method).unwrap();
            let decompressed = compressor.decompress(&compressed).unwrap();
            assert_eq!(decompressed, data, "method {}", method);
        }
    }

    #[test]
    fn test_pipeline_dictionary_size_matches_lzw() {
        let compressor = Compressor::default();
        let data = b"abababababcabcabcabc".repeat(4);
        let lzw = compressor.compress(&data, CompressionMethod::Lzw).unwrap();
        let composed = compressor.compress(&data, CompressionMethod::LzwHuffman).unwrap();
        assert_eq!(lzw.metadata.dictionary_size, composed.metadata.dictionary_size);
    }

    #[test]
    fn test_input_limit() {
        let config = CodecConfig {
            max_input_size: 4,
            ..CodecConfig::default()
        };
        let compressor = Compressor::new(config);
        let result = compressor.compress(b"12345", CompressionMethod::Huffman);
        assert!(matches!(
            result,
            Err(CompressError::InputTooLarge { size: 5, limit: 4 })
        ));
    }

    #[test]
    fn test_mismatched_state_rejected() {
        let compressor = Compressor::default();
        let mut output = compressor.compress(b"abc", CompressionMethod::Huffman).unwrap();
        output.method = CompressionMethod::Lzw;
        assert!(compressor.decompress(&output).is_err());
    }

    #[test]
    fn test_size_mismatch_detected() {
        let compressor = Compressor::default();
        let mut output = compressor.compress(b"abcabc", CompressionMethod::Lzw).unwrap();
        output.original_size = 7;
        assert!(matches!(
            compressor.decompress(&output),
            Err(CompressError::SizeMismatch { expected: 7, actual: 6 })
        ));
    }

    #[test]
    fn test_overflowing_frequencies_fail_cleanly() {
        let compressor = Compressor::default();
        let mut output = compressor.compress(b"ab", CompressionMethod::Huffman).unwrap();
        output.state = CodecState::Huffman {
            frequencies: [(b'a', u64::MAX), (b'b', u64::MAX)].into_iter().collect(),
        };
        assert!(matches!(
            compressor.decompress(&output),
            Err(CompressError::InvalidFrequencies(_))
        ));
    }

    #[test]
    fn test_envelope_bytes_roundtrip() {
        let compressor = Compressor::default();
        let data = b"envelope envelope envelope";
        let output = compressor.compress(data, CompressionMethod::LzwHuffman).unwrap();
        let restored = CompressedOutput::from_bytes(&output.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.state, output.state);
        assert_eq!(compressor.decompress(&restored).unwrap(), data);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("lzw-huffman".parse::<CompressionMethod>().unwrap(), CompressionMethod::LzwHuffman);
        assert!("zip".parse::<CompressionMethod>().is_err());
    }

    #[test]
    fn test_entropy_computation() {
        let uniform = vec![42u8; 100];
        assert!(compute_entropy(&uniform) < 0.01, "uniform data should have ~0 entropy");
        let all: Vec<u8> = (0..=255).collect();
        assert!((compute_entropy(&all) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_compression_ratio() {
        let compressor = Compressor::default();
        let data = "aaaaaaaaaa".repeat(100);
        let result = compressor.compress(data.as_bytes(), CompressionMethod::Huffman).unwrap();
        assert!(result.ratio < 1.0, "repetitive data should compress well");
    }
}
