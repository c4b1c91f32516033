//! Conversion between byte buffers and explicit bit sequences.
//!
//! Bit 0 of every byte is its most significant bit. Packing a sequence whose
//! length is not a multiple of 8 pads the last byte with zeros at the low-order
//! end, so callers that need the exact length must keep it next to the buffer.

use crate::error::{ChannelCodeError, Result};

/// Expand bytes into bits, MSB first
pub fn unpack(bytes: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1 == 1);
        }
    }
    bits
}

/// Collapse bits into bytes, MSB first, zero-padding the final byte
pub fn pack(bits: &[bool]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << (7 - i);
            }
        }
        bytes.push(byte);
    }
    bytes
}

/// Number of bytes needed to hold `bit_len` bits
pub fn byte_len(bit_len: usize) -> usize {
    bit_len.div_ceil(8)
}

/// An ordered run of bits with an exact logical length.
///
/// Decoders collect their output here so the padding added by `pack` is
/// never mistaken for data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitSequence {
    bits: Vec<bool>,
}

impl BitSequence {
    /// Unpack `bytes` and keep only the first `bit_len` bits.
    ///
    /// Fails with `InvalidParameter` when `bit_len` asks for more bits than
    /// the buffer holds.
    pub fn from_bytes_with_len(bytes: &[u8], bit_len: usize) -> Result<Self> {
        let mut seq = Self::from(unpack(bytes));
        seq.truncate_to(bit_len)?;
        Ok(seq)
    }

    /// Drop everything past `bit_len`; asking for more bits than are held is an error
    pub fn truncate_to(&mut self, bit_len: usize) -> Result<()> {
        if bit_len > self.bits.len() {
            return Err(ChannelCodeError::InvalidParameter(format!(
                "bit length {} exceeds the {} bits available",
                bit_len,
                self.bits.len()
            )));
        }
        self.bits.truncate(bit_len);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Pack into bytes; the logical length is `self.len()`, not `8 * bytes.len()`
    pub fn to_bytes(&self) -> Vec<u8> {
        pack(&self.bits)
    }
}

impl From<Vec<bool>> for BitSequence {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}
