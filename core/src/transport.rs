//! Opaque byte-stream link standing in for an external device.
//!
//! A real deployment would put a serial port behind [`Transport`]; the
//! in-process implementations here keep experiments deterministic.

use crate::channel::ChannelModel;
use crate::codec::{CodecKind, Decoded};
use crate::error::{ChannelCodeError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

pub trait Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Next message in send order; `TransportClosed` when nothing is pending
    fn receive(&mut self) -> Result<Vec<u8>>;
}

/// Perfect link: messages come back exactly as sent.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    queue: VecDeque<Vec<u8>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.queue.push_back(bytes.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        self.queue.pop_front().ok_or(ChannelCodeError::TransportClosed)
    }
}

/// Link that corrupts every message with a channel model on the way in.
#[derive(Debug)]
pub struct NoisyTransport<R: Rng> {
    channel: ChannelModel,
    rng: R,
    queue: VecDeque<Vec<u8>>,
    bits_sent: u64,
    bits_flipped: u64,
}

impl NoisyTransport<ChaCha8Rng> {
    pub fn seeded(channel: ChannelModel, seed: u64) -> Self {
        Self::new(channel, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> NoisyTransport<R> {
    pub fn new(channel: ChannelModel, rng: R) -> Self {
        Self {
            channel,
            rng,
            queue: VecDeque::new(),
            bits_sent: 0,
            bits_flipped: 0,
        }
    }

    pub fn bits_sent(&self) -> u64 {
        self.bits_sent
    }

    pub fn bits_flipped(&self) -> u64 {
        self.bits_flipped
    }
}

impl<R: Rng> Transport for NoisyTransport<R> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let received = self.channel.transmit(bytes, &mut self.rng)?;
        let flipped: u32 = bytes
            .iter()
            .zip(&received)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        self.bits_sent += bytes.len() as u64 * 8;
        self.bits_flipped += u64::from(flipped);
        self.queue.push_back(received);
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        self.queue.pop_front().ok_or(ChannelCodeError::TransportClosed)
    }
}

/// Encode, push through the link, pull the reply and decode it
pub fn exchange<T: Transport + ?Sized>(
    transport: &mut T,
    codec: CodecKind,
    data: &[u8],
) -> Result<Decoded> {
    transport.send(&codec.encode(data))?;
    let received = transport.receive()?;
    codec.decode(&received, data.len() * 8)
}
