//! Error types for lzw-huffman

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("malformed padding: {0}")]
    MalformedPadding(String),

    #[error("cannot pack {0} bits into bytes: length is not a multiple of 8")]
    UnpackableBitLength(usize),

    #[error("unknown code: {0}")]
    UnknownCode(String),

    #[error("invalid frequency table: {0}")]
    InvalidFrequencies(String),

    #[error("invalid lzw code stream: {0}")]
    InvalidCodeStream(String),

    #[error("input of {size} bytes exceeds the configured limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    #[error("decompression size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<bincode::Error> for CompressError {
    fn from(e: bincode::Error) -> Self {
        CompressError::SerializationError(e.to_string())
    }
}
