//! File drivers: read a whole file, run a [`Compressor`], write the result.
//!
//! Compressed files hold the bare padded payload: one pad-count byte, then the
//! packed code bits. Huffman and the composed pipeline write `<stem>.bin` plus
//! a `<stem>.bin.table` sidecar with the bincode-serialized frequency table;
//! LZW writes `<stem>.lzw.bin` alone, since its decoder needs nothing but the
//! payload and the configured width strategy. Decompression writes
//! `<stem><suffix>.txt` (suffix from
//! [`CodecConfig::decompressed_suffix`](crate::config::CodecConfig)).
//!
//! Output goes to a temporary file in the destination directory that is only
//! renamed into place once fully written.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::CompressError;
use crate::lzw;
use crate::{CodecState, CompressionMethod, Compressor};

const LZW_EXTENSION: &str = ".lzw.bin";
const SIDECAR_SUFFIX: &str = ".table";

#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Huffman state written next to a `.bin` payload.
    pub sidecar: Option<PathBuf>,
    pub input_size: u64,
    /// Size of the payload file alone.
    pub output_size: u64,
}

/// What a `.bin` payload needs besides its own bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Sidecar {
    method: CompressionMethod,
    original_size: usize,
    state: CodecState,
}

pub fn compressed_path(source: &Path, method: CompressionMethod) -> PathBuf {
    let extension = match method {
        CompressionMethod::Lzw => "lzw.bin",
        CompressionMethod::Huffman | CompressionMethod::LzwHuffman => "bin",
    };
    source.with_extension(extension)
}

pub fn decompressed_path(compressed: &Path, suffix: &str) -> PathBuf {
    let name = compressed
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(LZW_EXTENSION)
        .or_else(|| name.strip_suffix(".bin"))
        .map(str::to_owned)
        .unwrap_or_else(|| {
            Path::new(&name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
    compressed.with_file_name(format!("{}{}.txt", stem, suffix))
}

pub fn sidecar_path(payload: &Path) -> PathBuf {
    let mut name = payload.as_os_str().to_os_string();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

fn is_lzw_payload(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(LZW_EXTENSION))
        .unwrap_or(false)
}

pub fn compress_file(
    compressor: &Compressor,
    source: &Path,
    method: CompressionMethod,
) -> Result<FileReport, CompressError> {
    let data = fs::read(source)?;
    let output = compressor.compress(&data, method)?;
    let target = compressed_path(source, method);

    let sidecar = match method {
        CompressionMethod::Lzw => None,
        CompressionMethod::Huffman | CompressionMethod::LzwHuffman => {
            let path = sidecar_path(&target);
            let sidecar = Sidecar {
                method,
                original_size: output.original_size,
                state: output.state.clone(),
            };
            write_atomic(&path, &bincode::serialize(&sidecar)?)?;
            Some(path)
        }
    };
    write_atomic(&target, &output.data)?;

    let report = report(source, &target, sidecar)?;
    info!(
        %method,
        input = %report.input.display(),
        output = %report.output.display(),
        before = report.input_size,
        after = report.output_size,
        "compressed file"
    );
    Ok(report)
}

pub fn decompress_file(compressor: &Compressor, compressed: &Path) -> Result<FileReport, CompressError> {
    let payload = fs::read(compressed)?;
    let (method, data) = if is_lzw_payload(compressed) {
        let strategy = compressor.config().lzw_code_width;
        (CompressionMethod::Lzw, lzw::decompress(&payload, strategy)?)
    } else {
        let raw = fs::read(sidecar_path(compressed))?;
        let sidecar: Sidecar = bincode::deserialize(&raw)?;
        let data = compressor.decompress_payload(
            sidecar.method,
            &payload,
            &sidecar.state,
            sidecar.original_size,
        )?;
        (sidecar.method, data)
    };
    let target = decompressed_path(compressed, &compressor.config().decompressed_suffix);
    write_atomic(&target, &data)?;

    let report = report(compressed, &target, None)?;
    info!(
        %method,
        input = %report.input.display(),
        output = %report.output.display(),
        "decompressed file"
    );
    Ok(report)
}

/// Byte-for-byte comparison of two files.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool, CompressError> {
    Ok(fs::read(a)? == fs::read(b)?)
}

fn report(input: &Path, output: &Path, sidecar: Option<PathBuf>) -> Result<FileReport, CompressError> {
    Ok(FileReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        sidecar,
        input_size: fs::metadata(input)?.len(),
        output_size: fs::metadata(output)?.len(),
    })
}

fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), CompressError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| CompressError::IoError(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_path_naming() {
        let source = Path::new("data/dickens.txt");
        assert_eq!(
            compressed_path(source, CompressionMethod::Huffman),
            PathBuf::from("data/dickens.bin")
        );
        assert_eq!(
            compressed_path(source, CompressionMethod::Lzw),
            PathBuf::from("data/dickens.lzw.bin")
        );
    }

    #[test]
    fn test_decompressed_path_naming() {
        assert_eq!(
            decompressed_path(Path::new("data/dickens.bin"), "_decompressed"),
            PathBuf::from("data/dickens_decompressed.txt")
        );
        assert_eq!(
            decompressed_path(Path::new("dickens.lzw.bin"), "_decompressed"),
            PathBuf::from("dickens_decompressed.txt")
        );
        assert_eq!(
            decompressed_path(Path::new("notes.dat"), "_out"),
            PathBuf::from("notes_out.txt")
        );
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("sample.txt");
        let text = b"It was the best of times, it was the worst of times".repeat(20);
        fs::write(&source, &text).unwrap();

        let compressor = Compressor::default();
        for method in CompressionMethod::ALL {
            let packed = compress_file(&compressor, &source, method).unwrap();
            assert_eq!(packed.input_size, text.len() as u64);
            let unpacked = decompress_file(&compressor, &packed.output).unwrap();
            assert_eq!(unpacked.output, dir.path().join("sample_decompressed.txt"));
            assert!(files_identical(&source, &unpacked.output).unwrap());
        }
    }

    #[test]
    fn test_payload_bytes_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("abab.txt");
        fs::write(&source, b"ABABABA").unwrap();

        let compressor = Compressor::default();
        for method in CompressionMethod::ALL {
            let expected = compressor.compress(b"ABABABA", method).unwrap().data;
            let packed = compress_file(&compressor, &source, method).unwrap();
            assert_eq!(fs::read(&packed.output).unwrap(), expected, "{}", method);
            assert_eq!(packed.sidecar.is_some(), method != CompressionMethod::Lzw);
        }
        // codes 65, 66, 256, 258 at 9 bits, 4 pad bits
        assert_eq!(
            fs::read(dir.path().join("abab.lzw.bin")).unwrap(),
            vec![4, 0x20, 0x90, 0xa0, 0x10, 0x20]
        );
    }

    #[test]
    fn test_raw_lzw_file_decodes_alone() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("raw.lzw.bin");
        let text = b"TOBEORNOTTOBEORTOBEORNOT".repeat(30);
        let encoded = lzw::compress(&text, lzw::CodeWidthStrategy::FixedFinal).unwrap();
        fs::write(&payload, &encoded.data).unwrap();

        let unpacked = decompress_file(&Compressor::default(), &payload).unwrap();
        assert_eq!(fs::read(&unpacked.output).unwrap(), text);
    }

    #[test]
    fn test_missing_sidecar_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lonely.txt");
        fs::write(&source, b"no table, no decode").unwrap();

        let compressor = Compressor::default();
        let packed = compress_file(&compressor, &source, CompressionMethod::Huffman).unwrap();
        fs::remove_file(packed.sidecar.unwrap()).unwrap();
        assert!(decompress_file(&compressor, &packed.output).is_err());
        assert!(!dir.path().join("lonely_decompressed.txt").exists());
    }

    #[test]
    fn test_corrupt_file_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.lzw.bin");
        fs::write(&bogus, [0xffu8, 0x00, 0x01]).unwrap();

        let result = decompress_file(&Compressor::default(), &bogus);
        assert!(matches!(result, Err(CompressError::MalformedPadding(_))));
        assert!(!dir.path().join("bogus_decompressed.txt").exists());
    }

    #[test]
    fn test_sidecar_path_naming() {
        assert_eq!(
            sidecar_path(Path::new("data/dickens.bin")),
            PathBuf::from("data/dickens.bin.table")
        );
    }
}
