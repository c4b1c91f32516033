//! Channel coding experiments over simulated noisy links
//!
//! Bit-level channel models (binary symmetric and burst), repetition(3,1) and
//! Hamming(7,4) forward error correction, CRC and ones'-complement checksum
//! detectors, and the statistics and sweeps that tie them together.

pub mod bits;
pub mod channel;
pub mod checksum;
pub mod codec;
pub mod crc;
pub mod error;
pub mod hamming;
pub mod harness;
pub mod repetition;
pub mod stats;
pub mod transport;

pub use channel::{BinarySymmetricChannel, BurstChannel, ChannelModel};
pub use codec::{Codec, CodecKind, DecodeReport, Decoded, Uncoded};
pub use crc::{Crc, CrcParams};
pub use error::{ChannelCodeError, Result};
pub use hamming::Hamming74;
pub use harness::{run_sweep, Source, SweepConfig, SweepPoint, SweepSeries};
pub use repetition::Repetition3;
pub use stats::{bit_error_rate, hamming_distance, ErrorReport};
pub use transport::{LoopbackTransport, NoisyTransport, Transport};
