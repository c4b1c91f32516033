use crate::bits::BitSequence;
use crate::error::{ChannelCodeError, Result};
use crate::hamming::Hamming74;
use crate::repetition::Repetition3;
use serde::{Deserialize, Serialize};

/// A forward error correction scheme working on whole byte buffers.
///
/// `encode` may pad its output to a byte boundary, so `decode` is told how
/// many data bits the caller originally had.
pub trait Codec {
    fn name(&self) -> &'static str;

    /// Data bits per coded bit
    fn rate(&self) -> f64;

    fn encode(&self, data: &[u8]) -> Vec<u8>;

    /// Decode and trim the output to `bit_len` data bits
    fn decode(&self, encoded: &[u8], bit_len: usize) -> Result<Decoded>;
}

/// Raw transmission, no redundancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uncoded;

impl Codec for Uncoded {
    fn name(&self) -> &'static str {
        "none"
    }

    fn rate(&self) -> f64 {
        1.0
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decode(&self, encoded: &[u8], bit_len: usize) -> Result<Decoded> {
        let bits = BitSequence::from_bytes_with_len(encoded, bit_len)?;
        Ok(Decoded::from_bits(&bits, DecodeReport::default()))
    }
}

/// Forward error correction scheme applied before the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// Raw transmission, no redundancy
    None,
    /// Every bit sent three times, majority vote on receive
    Repetition3,
    /// Hamming(7,4) with single-error correction
    Hamming74,
}

impl CodecKind {
    pub const ALL: [CodecKind; 3] = [CodecKind::None, CodecKind::Repetition3, CodecKind::Hamming74];

    /// The scheme behind this selector
    pub fn codec(&self) -> &'static dyn Codec {
        match self {
            CodecKind::None => &Uncoded,
            CodecKind::Repetition3 => &Repetition3,
            CodecKind::Hamming74 => &Hamming74,
        }
    }

    pub fn name(&self) -> &'static str {
        self.codec().name()
    }

    pub fn rate(&self) -> f64 {
        self.codec().rate()
    }

    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        self.codec().encode(data)
    }

    pub fn decode(&self, encoded: &[u8], bit_len: usize) -> Result<Decoded> {
        self.codec().decode(encoded, bit_len)
    }
}

/// Per-call record of which blocks had disagreeing redundancy.
///
/// A flagged block was "detected but uncertain": the decoder still emitted
/// its best guess, which is right for a single error and wrong for heavier
/// patterns. Silent miscorrections never show up here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeReport {
    pub blocks: usize,
    pub flagged: Vec<usize>,
}

impl DecodeReport {
    pub fn new(blocks: usize) -> Self {
        Self {
            blocks,
            flagged: Vec::new(),
        }
    }

    pub(crate) fn flag(&mut self, block: usize) {
        log::trace!("block {} flagged by decoder", block);
        self.flagged.push(block);
    }

    pub fn flagged_blocks(&self) -> usize {
        self.flagged.len()
    }

    pub fn is_clean(&self) -> bool {
        self.flagged.is_empty()
    }
}

/// Decoder output: data bytes plus the observability report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub bytes: Vec<u8>,
    /// Logical length of `bytes` in bits
    pub bit_len: usize,
    pub report: DecodeReport,
}

impl Decoded {
    pub fn new(bytes: Vec<u8>, bit_len: usize, report: DecodeReport) -> Self {
        Self {
            bytes,
            bit_len,
            report,
        }
    }

    pub fn from_bits(bits: &BitSequence, report: DecodeReport) -> Self {
        Self::new(bits.to_bytes(), bits.len(), report)
    }

    /// Reject the output if any block was flagged
    pub fn into_strict(self) -> Result<Vec<u8>> {
        match self.report.flagged.first() {
            Some(&block) => Err(ChannelCodeError::UncorrectableBlock { block }),
            None => Ok(self.bytes),
        }
    }
}
