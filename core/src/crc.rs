//! Table-driven CRC with a configurable polynomial.
//!
//! The polynomial is written with its leading term, so `0x1_04C1_1DB7` is a
//! 32-bit CRC and `0x107` an 8-bit one. `init` is combined with `xor_out`
//! before the first byte (the register starts at `init ^ xor_out`); with that
//! convention `init = 0, xor_out = 0xFFFF_FFFF`, reflected, is the familiar
//! CRC-32.
//!
//! The `crc` crate is not used here because its `Algorithm` parameters are
//! `&'static` and typed per width, while these parameters arrive at runtime
//! (CLI flags, collision searches over arbitrary polynomials) with a width
//! chosen by the polynomial itself.

use crate::error::{ChannelCodeError, Result};
use serde::{Deserialize, Serialize};

const MIN_WIDTH: u32 = 8;
const MAX_WIDTH: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrcParams {
    /// Generator polynomial including the x^width term
    pub poly: u64,
    pub init: u64,
    pub xor_out: u64,
    /// Process bytes LSB first
    pub reflected: bool,
}

impl CrcParams {
    pub fn new(poly: u64, init: u64, xor_out: u64, reflected: bool) -> Result<Self> {
        let params = Self {
            poly,
            init,
            xor_out,
            reflected,
        };
        params.validate()?;
        Ok(params)
    }

    /// CRC-32 as used by zlib and Ethernet
    pub const fn crc32() -> Self {
        Self {
            poly: 0x1_04C1_1DB7,
            init: 0,
            xor_out: 0xFFFF_FFFF,
            reflected: true,
        }
    }

    /// CRC-8 with polynomial x^8 + x^2 + x + 1
    pub const fn crc8() -> Self {
        Self {
            poly: 0x107,
            init: 0,
            xor_out: 0,
            reflected: false,
        }
    }

    /// Degree of the polynomial
    pub fn width(&self) -> u32 {
        63u32.saturating_sub(self.poly.leading_zeros())
    }

    fn mask(&self) -> u64 {
        (1u64 << self.width()) - 1
    }

    fn validate(&self) -> Result<()> {
        let width = self.width();
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return Err(ChannelCodeError::InvalidParameter(format!(
                "polynomial {:#x} has width {}, supported widths are {}..={}",
                self.poly, width, MIN_WIDTH, MAX_WIDTH
            )));
        }
        if self.poly & 1 == 0 {
            return Err(ChannelCodeError::InvalidParameter(format!(
                "polynomial {:#x} has no constant term",
                self.poly
            )));
        }
        let mask = self.mask();
        if self.init > mask || self.xor_out > mask {
            return Err(ChannelCodeError::InvalidParameter(format!(
                "init {:#x} / xor_out {:#x} wider than {} bits",
                self.init, self.xor_out, width
            )));
        }
        Ok(())
    }
}

fn reflect(value: u32, width: u32) -> u32 {
    value.reverse_bits() >> (32 - width)
}

/// A CRC ready to run; the lookup table is built once and never changes.
#[derive(Debug, Clone)]
pub struct Crc {
    params: CrcParams,
    width: u32,
    mask: u32,
    table: [u32; 256],
}

impl Crc {
    pub fn new(params: CrcParams) -> Result<Self> {
        params.validate()?;
        let width = params.width();
        let mask = params.mask() as u32;
        let poly = (params.poly as u32) & mask;

        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = if params.reflected {
                let poly = reflect(poly, width);
                let mut crc = i as u32;
                for _ in 0..8 {
                    crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
                }
                crc
            } else {
                let top = 1u32 << (width - 1);
                let mut crc = (i as u32) << (width - 8);
                for _ in 0..8 {
                    let shifted = if crc & top != 0 {
                        (crc << 1) ^ poly
                    } else {
                        crc << 1
                    };
                    crc = shifted & mask;
                }
                crc
            };
        }

        Ok(Self {
            params,
            width,
            mask,
            table,
        })
    }

    pub fn params(&self) -> &CrcParams {
        &self.params
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// CRC of the whole buffer
    pub fn checksum(&self, data: &[u8]) -> u32 {
        let xor_out = self.params.xor_out as u32;
        let mut crc = (self.params.init as u32 ^ xor_out) & self.mask;

        if self.params.reflected {
            for &byte in data {
                crc = self.table[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
            }
        } else {
            let shift = self.width - 8;
            for &byte in data {
                let index = ((crc >> shift) ^ byte as u32) & 0xFF;
                crc = self.table[index as usize] ^ ((crc << 8) & self.mask);
            }
        }

        (crc ^ xor_out) & self.mask
    }

    /// True when `data` still hashes to `expected`. A match does not prove
    /// the data is intact, only that any corruption went undetected.
    pub fn verify(&self, data: &[u8], expected: u32) -> bool {
        self.checksum(data) == expected
    }
}
