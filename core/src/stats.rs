use crate::codec::DecodeReport;
use crate::error::{ChannelCodeError, Result};
use serde::Serialize;

fn ensure_same_len(original: &[u8], received: &[u8]) -> Result<()> {
    if original.len() != received.len() {
        return Err(ChannelCodeError::LengthMismatch {
            left: original.len(),
            right: received.len(),
        });
    }
    Ok(())
}

/// Number of differing bits between two equal-length buffers
pub fn hamming_distance(original: &[u8], received: &[u8]) -> Result<usize> {
    ensure_same_len(original, received)?;
    Ok(original
        .iter()
        .zip(received)
        .map(|(a, b)| (a ^ b).count_ones() as usize)
        .sum())
}

/// Fraction of differing bits; 0.0 for two empty buffers
pub fn bit_error_rate(original: &[u8], received: &[u8]) -> Result<f64> {
    let errors = hamming_distance(original, received)?;
    if original.is_empty() {
        return Ok(0.0);
    }
    Ok(errors as f64 / (original.len() * 8) as f64)
}

/// Outcome of one transmission, measured in the data domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub total_bits: usize,
    /// Data bits still wrong after decoding
    pub bit_errors: usize,
    pub bit_error_rate: f64,
    /// Bits the channel flipped in the coded stream, when known
    pub channel_bit_errors: Option<usize>,
    pub blocks: usize,
    pub flagged_blocks: usize,
}

impl ErrorReport {
    pub fn compare(
        original: &[u8],
        received: &[u8],
        decode_report: Option<&DecodeReport>,
    ) -> Result<Self> {
        let bit_errors = hamming_distance(original, received)?;
        let bit_error_rate = bit_error_rate(original, received)?;
        let (blocks, flagged_blocks) = decode_report
            .map(|r| (r.blocks, r.flagged_blocks()))
            .unwrap_or((0, 0));

        Ok(Self {
            total_bits: original.len() * 8,
            bit_errors,
            bit_error_rate,
            channel_bit_errors: None,
            blocks,
            flagged_blocks,
        })
    }

    pub fn with_channel_errors(mut self, channel_bit_errors: usize) -> Self {
        self.channel_bit_errors = Some(channel_bit_errors);
        self
    }

    /// True when at least one data bit survived decoding wrong
    pub fn has_residual_errors(&self) -> bool {
        self.bit_errors > 0
    }
}
