//! Configuration for lzw-huffman

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompressError;
use crate::lzw::CodeWidthStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub lzw_code_width: CodeWidthStrategy,
    pub max_input_size: usize,
    /// Appended to the file stem when writing decompressed output.
    pub decompressed_suffix: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            lzw_code_width: CodeWidthStrategy::FixedFinal,
            max_input_size: 100 * 1024 * 1024, // 100 MB
            decompressed_suffix: "_decompressed".to_string(),
        }
    }
}

impl CodecConfig {
    /// Load a (possibly partial) JSON config; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CompressError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CompressError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| CompressError::ConfigError(e.to_string()))?;
        if config.max_input_size == 0 {
            return Err(CompressError::ConfigError(
                "max_input_size must be greater than zero".into(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CodecConfig::from_json_str(r#"{"lzw_code_width": "growing"}"#).unwrap();
        assert_eq!(config.lzw_code_width, CodeWidthStrategy::Growing);
        assert_eq!(config.max_input_size, CodecConfig::default().max_input_size);
        assert_eq!(config.decompressed_suffix, "_decompressed");
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = CodecConfig::from_json_str(r#"{"max_input_size": 0}"#);
        assert!(matches!(result, Err(CompressError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(CodecConfig::from_json_str("{not json").is_err());
    }
}
