//! LZW compression and decompression
//!
//! The dictionary starts with the 256 single-byte strings and gains one entry
//! per emitted code. The decoder never sees the encoder's dictionary: it
//! rebuilds its own from the code stream, adding `previous + first byte of
//! current` after each decoded string.
//!
//! Codes are bit-packed at a width chosen by [`CodeWidthStrategy`]. The
//! default, [`CodeWidthStrategy::FixedFinal`], writes every code at the width
//! of the final next-code counter, so early codes are padded to the same size
//! as late ones.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bitstream;
use crate::error::CompressError;

/// Codes 0..=255 are the single bytes.
pub const SEED_CODES: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeWidthStrategy {
    /// Every code uses `bit_length(next_code)` measured after compression.
    #[default]
    FixedFinal,
    /// Code `i` uses `bit_length(256 + i)`, the counter value when it was emitted.
    Growing,
}

/// Number of bits needed to write `value`.
pub fn bit_length(value: u32) -> u32 {
    u32::BITS - value.leading_zeros()
}

fn growing_width(index: usize) -> u32 {
    bit_length(SEED_CODES + index as u32)
}

/// Byte string to code, as built by the encoder.
#[derive(Debug, Clone)]
pub struct Dictionary {
    codes: HashMap<Vec<u8>, u32>,
    next_code: u32,
}

impl Dictionary {
    pub fn new() -> Self {
        let codes = (0..SEED_CODES).map(|code| (vec![code as u8], code)).collect();
        Self {
            codes,
            next_code: SEED_CODES,
        }
    }

    pub fn get(&self, string: &[u8]) -> Option<u32> {
        self.codes.get(string).copied()
    }

    fn insert(&mut self, string: Vec<u8>) -> u32 {
        let code = self.next_code;
        self.codes.insert(string, code);
        self.next_code += 1;
        code
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The code the next inserted string will receive.
    pub fn next_code(&self) -> u32 {
        self.next_code
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Code to byte string, rebuilt on the decoding side.
#[derive(Debug, Clone)]
pub struct ReverseDictionary {
    entries: Vec<Vec<u8>>,
}

impl ReverseDictionary {
    pub fn new() -> Self {
        Self {
            entries: (0..SEED_CODES).map(|code| vec![code as u8]).collect(),
        }
    }

    pub fn get(&self, code: u32) -> Option<&[u8]> {
        self.entries.get(code as usize).map(Vec::as_slice)
    }

    fn push(&mut self, string: Vec<u8>) {
        self.entries.push(string);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReverseDictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-at-a-time LZW encoder.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    dictionary: Dictionary,
    current: Vec<u8>,
    current_code: Option<u32>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the current match by `byte`. When the extended string is
    /// unknown, the match's code is returned and the extended string is added
    /// to the dictionary.
    pub fn push(&mut self, byte: u8) -> Option<u32> {
        self.current.push(byte);
        if let Some(code) = self.dictionary.get(&self.current) {
            self.current_code = Some(code);
            return None;
        }
        // `current` minus `byte` was a known, non-empty match
        let emitted = self.current_code;
        self.dictionary.insert(std::mem::replace(&mut self.current, vec![byte]));
        self.current_code = Some(u32::from(byte));
        emitted
    }

    /// Flush the pending match, if any. Does not grow the dictionary.
    pub fn finish(&mut self) -> Option<u32> {
        self.current.clear();
        self.current_code.take()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn into_dictionary(self) -> Dictionary {
        self.dictionary
    }
}

/// Run the encoder over `data`, returning the emitted codes and the final dictionary.
pub fn compress_codes(data: &[u8]) -> (Vec<u32>, Dictionary) {
    let mut encoder = Encoder::new();
    let mut codes: Vec<u32> = data.iter().filter_map(|&byte| encoder.push(byte)).collect();
    codes.extend(encoder.finish());
    (codes, encoder.into_dictionary())
}

pub fn decompress_codes(codes: &[u32]) -> Result<Vec<u8>, CompressError> {
    let mut reverse = ReverseDictionary::new();
    let mut output = Vec::new();
    let mut previous: Option<Vec<u8>> = None;

    for &code in codes {
        let entry = match (reverse.get(code), &previous) {
            (Some(entry), _) => entry.to_vec(),
            // the code the encoder added while emitting `previous`
            (None, Some(prev)) if code as usize == reverse.len() => {
                let mut entry = prev.clone();
                entry.push(prev[0]);
                entry
            }
            _ => {
                return Err(CompressError::UnknownCode(format!(
                    "lzw code {} with {} dictionary entries",
                    code,
                    reverse.len()
                )))
            }
        };
        output.extend_from_slice(&entry);
        if let Some(mut prev) = previous.take() {
            prev.push(entry[0]);
            reverse.push(prev);
        }
        previous = Some(entry);
    }

    Ok(output)
}

#[derive(Debug, Clone)]
pub struct LzwEncoded {
    pub data: Vec<u8>,
    /// Width of the last code written; the width of every code under `FixedFinal`.
    pub code_width: u32,
    pub code_count: usize,
    pub dictionary_size: usize,
}

/// Compress data into a padded, bit-packed LZW code stream
pub fn compress(data: &[u8], strategy: CodeWidthStrategy) -> Result<LzwEncoded, CompressError> {
    let (codes, dictionary) = compress_codes(data);
    let final_width = bit_length(dictionary.next_code());

    let mut bits = Vec::new();
    match strategy {
        CodeWidthStrategy::FixedFinal => {
            for &code in &codes {
                bitstream::push_code(&mut bits, code, final_width);
            }
        }
        CodeWidthStrategy::Growing => {
            for (index, &code) in codes.iter().enumerate() {
                bitstream::push_code(&mut bits, code, growing_width(index));
            }
        }
    }

    debug!(
        input = data.len(),
        codes = codes.len(),
        dictionary = dictionary.len(),
        width = final_width,
        ?strategy,
        "lzw encoded"
    );

    Ok(LzwEncoded {
        data: bitstream::pack(&bits)?,
        code_width: final_width,
        code_count: codes.len(),
        dictionary_size: dictionary.len(),
    })
}

/// Decompress a fixed-width stream whose width is already known.
pub fn decompress_with_width(data: &[u8], width: u32) -> Result<Vec<u8>, CompressError> {
    let bits = bitstream::unpack(data)?;
    let codes = split_fixed(&bits, width)?;
    decompress_codes(&codes)
}

pub fn decompress(data: &[u8], strategy: CodeWidthStrategy) -> Result<Vec<u8>, CompressError> {
    let bits = bitstream::unpack(data)?;
    let codes = match strategy {
        CodeWidthStrategy::FixedFinal => {
            if bits.is_empty() {
                Vec::new()
            } else {
                split_fixed(&bits, infer_fixed_width(bits.len())?)?
            }
        }
        CodeWidthStrategy::Growing => split_growing(&bits)?,
    };
    decompress_codes(&codes)
}

/// Recover the `FixedFinal` width from the payload length.
///
/// `n` codes leave the counter at `255 + n`, so a width `w` is consistent
/// when `len == n * w` and `bit_length(255 + n) == w`. The ranges of lengths
/// admitted by each width do not overlap, so at most one width fits.
pub fn infer_fixed_width(bit_len: usize) -> Result<u32, CompressError> {
    for width in bit_length(SEED_CODES)..=u32::BITS {
        if bit_len % width as usize != 0 {
            continue;
        }
        let count = bit_len / width as usize;
        let Some(counter) = u32::try_from(count)
            .ok()
            .and_then(|n| n.checked_add(SEED_CODES - 1))
        else {
            continue;
        };
        if bit_length(counter) == width {
            return Ok(width);
        }
    }
    Err(CompressError::InvalidCodeStream(format!(
        "{} payload bits fit no fixed code width",
        bit_len
    )))
}

fn split_fixed(bits: &[bool], width: u32) -> Result<Vec<u32>, CompressError> {
    if width == 0 || width > u32::BITS {
        return Err(CompressError::InvalidCodeStream(format!(
            "code width {} out of range",
            width
        )));
    }
    if bits.len() % width as usize != 0 {
        return Err(CompressError::InvalidCodeStream(format!(
            "{} bits is not a whole number of {}-bit codes",
            bits.len(),
            width
        )));
    }
    Ok(bits.chunks(width as usize).map(bitstream::read_code).collect())
}

fn split_growing(bits: &[bool]) -> Result<Vec<u32>, CompressError> {
    let mut codes = Vec::new();
    let mut pos = 0;
    while pos < bits.len() {
        let width = growing_width(codes.len()) as usize;
        if pos + width > bits.len() {
            return Err(CompressError::InvalidCodeStream(format!(
                "truncated {}-bit code at bit {}",
                width, pos
            )));
        }
        codes.push(bitstream::read_code(&bits[pos..pos + width]));
        pos += width;
    }
    Ok(codes)
}
