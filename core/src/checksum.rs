//! Ones'-complement sum of big-endian 16-bit words, as used by IP, TCP and UDP.
//!
//! Input must be an even number of bytes. Padding odd buffers is the caller's job.

use crate::error::{ChannelCodeError, Result};

pub fn internet_checksum(data: &[u8]) -> Result<u16> {
    if data.len() % 2 != 0 {
        return Err(ChannelCodeError::InvalidLength { len: data.len() });
    }

    let mut sum: u64 = data
        .chunks_exact(2)
        .map(|word| u64::from(u16::from_be_bytes([word[0], word[1]])))
        .sum();

    // End-around carry
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    Ok(!(sum as u16))
}

/// Recompute and compare against a previously transmitted checksum
pub fn verify(data: &[u8], checksum: u16) -> Result<bool> {
    Ok(internet_checksum(data)? == checksum)
}
