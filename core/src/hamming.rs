//! Hamming(7,4) with syndrome decoding.
//!
//! Codeword layout (positions 1..=7): `p1 p2 d1 p3 d2 d3 d4` where
//! `p1 = d1^d2^d4`, `p2 = d1^d3^d4`, `p3 = d2^d3^d4`.
//!
//! A single flipped bit per block is always corrected. Two or more flips are
//! beyond the code: the syndrome then points at an innocent position and the
//! decoder confidently emits wrong data.

use crate::bits::{pack, unpack, BitSequence};
use crate::codec::{Codec, DecodeReport, Decoded};
use crate::error::Result;

pub const DATA_BITS: usize = 4;
pub const BLOCK_BITS: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hamming74;

impl Codec for Hamming74 {
    fn name(&self) -> &'static str {
        "hamming(7,4)"
    }

    fn rate(&self) -> f64 {
        DATA_BITS as f64 / BLOCK_BITS as f64
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        encode(data)
    }

    fn decode(&self, encoded: &[u8], bit_len: usize) -> Result<Decoded> {
        decode(encoded, bit_len)
    }
}

/// Codeword positions (0-based) covered by each parity check c1, c2, c3
const PARITY_CHECKS: [[usize; 4]; 3] = [[0, 2, 4, 6], [1, 2, 5, 6], [3, 4, 5, 6]];

/// Codeword positions (0-based) of d1..d4
const DATA_POSITIONS: [usize; DATA_BITS] = [2, 4, 5, 6];

/// Syndrome value -> 1-based codeword position to flip (`None` = no error)
pub const SYNDROME_TABLE: [Option<u8>; 8] = build_syndrome_table();

/// Derive the table by computing the syndrome a lone error at each position produces
const fn build_syndrome_table() -> [Option<u8>; 8] {
    let mut table = [None; 8];
    let mut position = 0;
    while position < BLOCK_BITS {
        let mut syndrome = 0usize;
        let mut check = 0;
        while check < PARITY_CHECKS.len() {
            let mut covered = false;
            let mut i = 0;
            while i < PARITY_CHECKS[check].len() {
                if PARITY_CHECKS[check][i] == position {
                    covered = true;
                }
                i += 1;
            }
            if covered {
                syndrome |= 1 << check;
            }
            check += 1;
        }
        table[syndrome] = Some(position as u8 + 1);
        position += 1;
    }
    table
}

pub fn encode_block(data: [bool; DATA_BITS]) -> [bool; BLOCK_BITS] {
    let [d1, d2, d3, d4] = data;
    let p1 = d1 ^ d2 ^ d4;
    let p2 = d1 ^ d3 ^ d4;
    let p3 = d2 ^ d3 ^ d4;
    [p1, p2, d1, p3, d2, d3, d4]
}

/// Syndrome `c1 | c2 << 1 | c3 << 2` of a received block
pub fn syndrome(block: &[bool; BLOCK_BITS]) -> u8 {
    let mut syndrome = 0u8;
    for (check, positions) in PARITY_CHECKS.iter().enumerate() {
        let parity = positions.iter().fold(false, |acc, &p| acc ^ block[p]);
        if parity {
            syndrome |= 1 << check;
        }
    }
    syndrome
}

/// Apply at most one correction and return the data bits plus the syndrome seen
pub fn decode_block(mut block: [bool; BLOCK_BITS]) -> ([bool; DATA_BITS], u8) {
    let syndrome = syndrome(&block);
    if let Some(position) = SYNDROME_TABLE[syndrome as usize] {
        let index = position as usize - 1;
        block[index] = !block[index];
    }
    (DATA_POSITIONS.map(|p| block[p]), syndrome)
}

/// Encode bits block by block, zero-padding a short final nibble
pub fn encode_bits(bits: &[bool]) -> Vec<bool> {
    let blocks = bits.len().div_ceil(DATA_BITS);
    let mut output = Vec::with_capacity(blocks * BLOCK_BITS);
    for chunk in bits.chunks(DATA_BITS) {
        let mut data = [false; DATA_BITS];
        data[..chunk.len()].copy_from_slice(chunk);
        output.extend_from_slice(&encode_block(data));
    }
    output
}

/// Decode every complete 7-bit block; leftover bits are packing padding
pub fn decode_bits(bits: &[bool]) -> (Vec<bool>, DecodeReport) {
    let blocks = bits.len() / BLOCK_BITS;
    let mut report = DecodeReport::new(blocks);
    let mut output = Vec::with_capacity(blocks * DATA_BITS);

    for (index, chunk) in bits.chunks_exact(BLOCK_BITS).enumerate() {
        let mut block = [false; BLOCK_BITS];
        block.copy_from_slice(chunk);
        let (data, syndrome) = decode_block(block);
        if syndrome != 0 {
            report.flag(index);
        }
        output.extend_from_slice(&data);
    }

    (output, report)
}

pub fn encode(data: &[u8]) -> Vec<u8> {
    pack(&encode_bits(&unpack(data)))
}

/// Decode `encoded` and strip padding down to `bit_len` original bits
pub fn decode(encoded: &[u8], bit_len: usize) -> Result<Decoded> {
    let (bits, report) = decode_bits(&unpack(encoded));
    let mut bits = BitSequence::from(bits);
    bits.truncate_to(bit_len)?;
    Ok(Decoded::from_bits(&bits, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nibble(value: u8) -> [bool; DATA_BITS] {
        [
            value & 0b1000 != 0,
            value & 0b0100 != 0,
            value & 0b0010 != 0,
            value & 0b0001 != 0,
        ]
    }

    #[test]
    fn test_syndrome_table_is_exhaustive() {
        assert_eq!(SYNDROME_TABLE[0], None);
        for s in 1..8 {
            // With this layout the syndrome spells out the position directly
            assert_eq!(SYNDROME_TABLE[s], Some(s as u8));
        }
    }

    #[test]
    fn test_known_codeword() {
        // d = 1011 -> p1=0 p2=1 p3=0 -> 0110011
        let block = encode_block(nibble(0b1011));
        assert_eq!(block, [false, true, true, false, false, true, true]);
        assert_eq!(syndrome(&block), 0);
    }

    #[test]
    fn test_encode_bytes_layout() {
        // 1011 0000 -> 0110011 0000000 + 2 pad bits
        assert_eq!(encode(&[0xB0]), vec![0x66, 0x00]);
    }

    #[test]
    fn test_every_single_bit_error_is_corrected() {
        for value in 0..16u8 {
            let data = nibble(value);
            let codeword = encode_block(data);
            for position in 0..BLOCK_BITS {
                let mut received = codeword;
                received[position] = !received[position];
                let (decoded, syndrome) = decode_block(received);
                assert_eq!(decoded, data, "value {:04b} position {}", value, position);
                assert_eq!(syndrome as usize, position + 1);
            }
        }
    }

    #[test]
    fn test_double_error_is_miscorrected() {
        let data = nibble(0b0000);
        let mut received = encode_block(data);
        received[0] = true;
        received[1] = true;
        // syndrome 0b011 blames position 3, which is d1
        let (decoded, syndrome) = decode_block(received);
        assert_eq!(syndrome, 3);
        assert_eq!(decoded, nibble(0b1000));
    }

    #[test]
    fn test_round_trip_with_length() {
        let data: Vec<u8> = (0..=255).collect();
        let decoded = decode(&encode(&data), data.len() * 8).unwrap();
        assert_eq!(decoded.bytes, data);
        assert_eq!(decoded.report.blocks, data.len() * 2);
        assert!(decoded.report.is_clean());
    }

    #[test]
    fn test_partial_final_block_is_padded_and_trimmed() {
        let bits = [true, false, true, true, true, true];
        let encoded = encode_bits(&bits);
        assert_eq!(encoded.len(), 2 * BLOCK_BITS);
        let (decoded, _) = decode_bits(&encoded);
        assert_eq!(&decoded[..bits.len()], &bits);
        assert_eq!(&decoded[bits.len()..], &[false, false]);
    }

    #[test]
    fn test_flagged_blocks_are_reported() {
        let mut encoded = unpack(&encode(&[0x5A, 0xC3]));
        encoded[BLOCK_BITS + 2] = !encoded[BLOCK_BITS + 2];
        let decoded = decode(&pack(&encoded), 16).unwrap();
        assert_eq!(decoded.bytes, vec![0x5A, 0xC3]);
        assert_eq!(decoded.report.flagged, vec![1]);
    }

    #[test]
    fn test_decode_rejects_length_beyond_payload() {
        let encoded = encode(&[0xFF]);
        assert!(decode(&encoded, 9).is_err());
    }
}
