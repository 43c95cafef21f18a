//! Bit string packing with a self-describing padding header
//!
//! Every encoder in this crate produces a `Vec<bool>` bit string (MSB first).
//! Before it hits a byte buffer the string is padded: `extra` zero bits are
//! appended to reach a byte boundary, and one header byte holding `extra` is
//! prepended. A string whose length is already a multiple of 8 still gets a
//! full byte of padding (`extra == 8`), which keeps the layout compatible with
//! existing `.bin` files.

use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::error::CompressError;

/// Width of the padding header, in bits.
pub const HEADER_BITS: usize = 8;

/// Append zero bits up to the next byte boundary and prepend the 8-bit padding count.
pub fn pad(bits: &[bool]) -> Vec<bool> {
    let extra = 8 - bits.len() % 8;
    let mut padded = Vec::with_capacity(HEADER_BITS + bits.len() + extra);
    push_code(&mut padded, extra as u32, HEADER_BITS as u32);
    padded.extend_from_slice(bits);
    padded.resize(padded.len() + extra, false);
    padded
}

/// Strip the header and the trailing pad bits it announces.
pub fn unpad(padded: &[bool]) -> Result<Vec<bool>, CompressError> {
    if padded.len() < HEADER_BITS {
        return Err(CompressError::MalformedPadding(format!(
            "{} bits is shorter than the {}-bit header",
            padded.len(),
            HEADER_BITS
        )));
    }
    let extra = read_code(&padded[..HEADER_BITS]) as usize;
    let body = &padded[HEADER_BITS..];
    if extra > 8 {
        return Err(CompressError::MalformedPadding(format!(
            "header announces {} pad bits, at most 8 allowed",
            extra
        )));
    }
    if extra > body.len() {
        return Err(CompressError::MalformedPadding(format!(
            "header announces {} pad bits but only {} bits follow",
            extra,
            body.len()
        )));
    }
    Ok(body[..body.len() - extra].to_vec())
}

/// Pack a byte-aligned bit string into bytes, MSB first.
pub fn bits_to_bytes(bits: &[bool]) -> Result<Vec<u8>, CompressError> {
    if bits.len() % 8 != 0 {
        return Err(CompressError::UnpackableBitLength(bits.len()));
    }
    let mut output = Vec::with_capacity(bits.len() / 8);
    {
        let mut writer = BitWriter::endian(&mut output, BigEndian);
        for &bit in bits {
            writer.write_bit(bit)?;
        }
    }
    Ok(output)
}

/// Expand every byte into its 8 bits, MSB first.
pub fn bytes_to_bits(bytes: &[u8]) -> Result<Vec<bool>, CompressError> {
    let mut reader = BitReader::endian(Cursor::new(bytes), BigEndian);
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for _ in 0..bytes.len() * 8 {
        bits.push(reader.read_bit()?);
    }
    Ok(bits)
}

/// `bits_to_bytes(pad(bits))`
pub fn pack(bits: &[bool]) -> Result<Vec<u8>, CompressError> {
    bits_to_bytes(&pad(bits))
}

/// `unpad(bytes_to_bits(bytes))`
pub fn unpack(bytes: &[u8]) -> Result<Vec<bool>, CompressError> {
    unpad(&bytes_to_bits(bytes)?)
}

/// Append the low `width` bits of `value`, most significant first.
pub fn push_code(bits: &mut Vec<bool>, value: u32, width: u32) {
    debug_assert!(width <= 32);
    bits.extend((0..width).rev().map(|i| (value >> i) & 1 == 1));
}

/// Interpret a big-endian bit slice (at most 32 bits) as an integer.
pub fn read_code(bits: &[bool]) -> u32 {
    bits.iter().fold(0u32, |acc, &bit| (acc << 1) | bit as u32)
}
