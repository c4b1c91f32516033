//! Bit error models applied to byte buffers.
//!
//! Both models return a freshly allocated buffer; the input is never touched.
//! Randomness is always supplied by the caller so that a seeded generator
//! reproduces an experiment exactly.

use crate::error::{ChannelCodeError, Result};
use rand::Rng;
use serde::Serialize;

/// Flip bit `index` (MSB-first numbering) of `data` in place
pub(crate) fn flip_bit(data: &mut [u8], index: usize) {
    data[index / 8] ^= 0x80 >> (index % 8);
}

/// Binary symmetric channel: every bit flips independently with probability `p`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinarySymmetricChannel {
    p: f64,
}

impl BinarySymmetricChannel {
    /// `p` must lie in [0, 1]; NaN is rejected as well
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(ChannelCodeError::InvalidParameter(format!(
                "error probability {} is outside [0, 1]",
                p
            )));
        }
        Ok(Self { p })
    }

    pub fn probability(&self) -> f64 {
        self.p
    }

    /// Send `data` through the channel.
    ///
    /// One uniform draw in [0, 1) is consumed per bit, in bit order, and the
    /// bit flips when the draw is below `p`.
    pub fn transmit<R: Rng + ?Sized>(&self, data: &[u8], rng: &mut R) -> Vec<u8> {
        let mut received = Vec::with_capacity(data.len());
        for &byte in data {
            let mut mask = 0u8;
            for i in (0..8).rev() {
                if rng.gen::<f64>() < self.p {
                    mask |= 1 << i;
                }
            }
            received.push(byte ^ mask);
        }
        received
    }
}

/// Flips exactly `length` contiguous bits starting at bit `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BurstChannel {
    length: usize,
    offset: usize,
}

impl BurstChannel {
    pub fn new(length: usize, offset: usize) -> Self {
        Self { length, offset }
    }

    /// Burst measured in whole bytes, i.e. every bit of `length` bytes
    /// starting at byte `offset` is inverted
    pub fn bytes(length: usize, offset: usize) -> Result<Self> {
        let to_bits = |bytes: usize| {
            bytes.checked_mul(8).ok_or_else(|| {
                ChannelCodeError::InvalidParameter(format!(
                    "burst of {} bytes at byte {} is not addressable in bits",
                    length, offset
                ))
            })
        };
        Ok(Self {
            length: to_bits(length)?,
            offset: to_bits(offset)?,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>> {
        let total_bits = data.len() * 8;
        let end = self.offset.checked_add(self.length);
        if end.map_or(true, |end| end > total_bits) {
            return Err(ChannelCodeError::InvalidParameter(format!(
                "burst of {} bits at offset {} exceeds {} bits",
                self.length, self.offset, total_bits
            )));
        }

        let mut received = data.to_vec();
        for index in self.offset..self.offset + self.length {
            flip_bit(&mut received, index);
        }
        Ok(received)
    }
}

/// Any of the supported channels, including the ideal one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ChannelModel {
    Noiseless,
    Bsc(BinarySymmetricChannel),
    Burst(BurstChannel),
}

impl ChannelModel {
    pub fn transmit<R: Rng + ?Sized>(&self, data: &[u8], rng: &mut R) -> Result<Vec<u8>> {
        match self {
            ChannelModel::Noiseless => Ok(data.to_vec()),
            ChannelModel::Bsc(bsc) => Ok(bsc.transmit(data, rng)),
            ChannelModel::Burst(burst) => burst.apply(data),
        }
    }
}
