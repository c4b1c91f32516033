//! Repetition(3,1): each bit is sent three times and decoded by majority vote.
//!
//! One flipped bit per triplet is corrected. Two or three flips produce the
//! wrong bit with no indication beyond the triplet being non-unanimous (two
//! flips) or perfectly unanimous (three flips).
//!
//! Trailing coded bits that do not fill a whole triplet are dropped.

use crate::bits::{pack, unpack, BitSequence};
use crate::codec::{Codec, DecodeReport, Decoded};
use crate::error::Result;

const REPETITIONS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Repetition3;

impl Codec for Repetition3 {
    fn name(&self) -> &'static str {
        "repetition(3,1)"
    }

    fn rate(&self) -> f64 {
        1.0 / REPETITIONS as f64
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        encode(data)
    }

    fn decode(&self, encoded: &[u8], bit_len: usize) -> Result<Decoded> {
        decode_with_len(encoded, bit_len)
    }
}

pub fn encode_bits(bits: &[bool]) -> Vec<bool> {
    let mut output = Vec::with_capacity(bits.len() * REPETITIONS);
    for &bit in bits {
        for _ in 0..REPETITIONS {
            output.push(bit);
        }
    }
    output
}

/// Majority-decode every complete triplet
pub fn decode_bits(bits: &[bool]) -> (Vec<bool>, DecodeReport) {
    let blocks = bits.len() / REPETITIONS;
    let mut report = DecodeReport::new(blocks);
    let mut output = Vec::with_capacity(blocks);

    for (block, triplet) in bits.chunks_exact(REPETITIONS).enumerate() {
        let ones = triplet.iter().filter(|&&b| b).count();
        if ones != 0 && ones != REPETITIONS {
            report.flag(block);
        }
        output.push(ones > REPETITIONS / 2);
    }

    (output, report)
}

pub fn encode(data: &[u8]) -> Vec<u8> {
    pack(&encode_bits(&unpack(data)))
}

/// Decode a byte buffer; the output holds one bit per complete triplet
pub fn decode(encoded: &[u8]) -> Decoded {
    let (bits, report) = decode_bits(&unpack(encoded));
    Decoded::from_bits(&BitSequence::from(bits), report)
}

/// Decode and keep the first `bit_len` data bits
pub fn decode_with_len(encoded: &[u8], bit_len: usize) -> Result<Decoded> {
    let (bits, report) = decode_bits(&unpack(encoded));
    let mut bits = BitSequence::from(bits);
    bits.truncate_to(bit_len)?;
    Ok(Decoded::from_bits(&bits, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_triples_each_bit() {
        // 1010_0000 -> 111 000 111 000 000 000 000 000
        let encoded = encode(&[0b1010_0000]);
        assert_eq!(encoded, vec![0b1110_0011, 0b1000_0000, 0b0000_0000]);
        assert_eq!(encode_bits(&[true, false]).len(), 6);
    }

    #[test]
    fn test_round_trip() {
        let data: Vec<u8> = (0..=255).collect();
        let decoded = decode(&encode(&data));
        assert_eq!(decoded.bytes, data);
        assert_eq!(decoded.bit_len, data.len() * 8);
        assert_eq!(decoded.report.blocks, data.len() * 8);
        assert!(decoded.report.is_clean());
    }

    #[test]
    fn test_single_flip_in_any_triplet_position_is_corrected() {
        for original in [false, true] {
            for position in 0..3 {
                let mut triplet = encode_bits(&[original]);
                triplet[position] = !triplet[position];
                let (bits, report) = decode_bits(&triplet);
                assert_eq!(bits, vec![original]);
                assert_eq!(report.flagged, vec![0]);
            }
        }
    }

    #[test]
    fn test_double_flip_decodes_wrong_bit() {
        let mut triplet = encode_bits(&[true]);
        triplet[0] = false;
        triplet[2] = false;
        let (bits, report) = decode_bits(&triplet);
        assert_eq!(bits, vec![false]);
        assert_eq!(report.flagged_blocks(), 1);
    }

    #[test]
    fn test_triple_flip_is_silent() {
        let (bits, report) = decode_bits(&[false, false, false]);
        assert_eq!(bits, vec![false]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_incomplete_triplet_is_truncated() {
        // 8 coded bits hold two full triplets
        let decoded = decode(&[0b1110_0011]);
        assert_eq!(decoded.bit_len, 2);
        assert_eq!(decoded.bytes, vec![0b1000_0000]);
        assert_eq!(decoded.report.blocks, 2);
    }

    #[test]
    fn test_decode_with_len() {
        let encoded = encode(&[0xC3, 0x5A]);
        let decoded = decode_with_len(&encoded, 12).unwrap();
        assert_eq!(decoded.bytes, vec![0xC3, 0x50]);
        assert!(decode_with_len(&encoded, 17).is_err());
    }
}
