//! LZW followed by Huffman
//!
//! LZW turns the input into integer codes, which are never bit-packed here;
//! each distinct code becomes a Huffman symbol and the code stream is
//! Huffman-encoded into the usual padded payload.

use tracing::debug;

use crate::error::CompressError;
use crate::huffman::{self, CodeTable, FrequencyTable, HuffmanEncoded};
use crate::lzw;

pub fn compress(data: &[u8]) -> Result<HuffmanEncoded<u32>, CompressError> {
    let (codes, dictionary) = lzw::compress_codes(data);
    debug!(
        input = data.len(),
        codes = codes.len(),
        dictionary = dictionary.len(),
        "lzw stage done"
    );
    huffman::encode_symbols(&codes)
}

pub fn decompress(data: &[u8], table: &CodeTable<u32>) -> Result<Vec<u8>, CompressError> {
    let codes = huffman::decode_symbols(data, table)?;
    lzw::decompress_codes(&codes)
}

/// Decompress using the frequency table stored alongside the payload.
pub fn decompress_with_frequencies(
    data: &[u8],
    frequencies: &FrequencyTable<u32>,
) -> Result<Vec<u8>, CompressError> {
    decompress(data, &CodeTable::from_frequencies(frequencies)?)
}
