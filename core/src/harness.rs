//! Parameter sweeps and detection experiments built on the codecs and channels.
//!
//! Nothing here knows how a codec works; it only iterates, seeds and averages.
//! Every trial owns a generator seeded from its coordinates in the sweep, so a
//! parallel run produces exactly the numbers a serial run does.

use crate::channel::{BinarySymmetricChannel, BurstChannel, ChannelModel};
use crate::checksum;
use crate::codec::CodecKind;
use crate::crc::Crc;
use crate::error::{ChannelCodeError, Result};
use crate::stats::{hamming_distance, ErrorReport};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Error probabilities swept by default
pub const DEFAULT_PROBABILITIES: [f64; 5] = [1e-6, 1e-5, 1e-4, 1e-3, 1e-2];

/// Burst lengths, in bytes, for the default CRC experiment
pub const DEFAULT_BURST_LENGTHS: [usize; 5] = [0, 1, 2, 3, 4];

/// Size of the random block used by the default CRC experiment
pub const DEFAULT_CRC_BLOCK_BYTES: usize = 1024 / 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub probabilities: Vec<f64>,
    pub codecs: Vec<CodecKind>,
    pub trials: usize,
    pub seed: u64,
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            probabilities: DEFAULT_PROBABILITIES.to_vec(),
            codecs: CodecKind::ALL.to_vec(),
            trials: 1,
            seed: 0,
            parallel: true,
        }
    }
}

impl SweepConfig {
    /// Build the channels up front so a bad probability fails before any work
    pub fn channels(&self) -> Result<Vec<BinarySymmetricChannel>> {
        if self.trials == 0 {
            return Err(ChannelCodeError::InvalidParameter(
                "trials must be > 0".to_string(),
            ));
        }
        self.probabilities
            .iter()
            .map(|&p| BinarySymmetricChannel::new(p))
            .collect()
    }
}

/// A named input buffer
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub data: Vec<u8>,
}

impl Source {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Averages over all trials at one error probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub p: f64,
    pub trials: usize,
    /// Mean data-domain BER after decoding
    pub mean_ber: f64,
    /// Mean fraction of coded bits the channel flipped
    pub mean_channel_ber: f64,
    pub mean_flagged_blocks: f64,
    pub trials_with_residual_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSeries {
    pub source: String,
    pub codec: CodecKind,
    pub code_rate: f64,
    pub points: Vec<SweepPoint>,
}

/// Mix the coordinates of a trial into its own seed (splitmix64 finaliser)
pub fn trial_seed(base: u64, coordinates: &[u64]) -> u64 {
    let mut state = base;
    for &c in coordinates {
        state = state.wrapping_add(c).wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        state = z ^ (z >> 31);
    }
    state
}

/// encode -> channel -> decode -> compare, for one buffer
pub fn run_trial<R: Rng + ?Sized>(
    data: &[u8],
    codec: CodecKind,
    channel: &ChannelModel,
    rng: &mut R,
) -> Result<ErrorReport> {
    let encoded = codec.encode(data);
    run_encoded_trial(data, &encoded, codec, channel, rng)
}

fn run_encoded_trial<R: Rng + ?Sized>(
    data: &[u8],
    encoded: &[u8],
    codec: CodecKind,
    channel: &ChannelModel,
    rng: &mut R,
) -> Result<ErrorReport> {
    let received = channel.transmit(encoded, rng)?;
    let channel_errors = hamming_distance(encoded, &received)?;
    let decoded = codec.decode(&received, data.len() * 8)?;
    Ok(ErrorReport::compare(data, &decoded.bytes, Some(&decoded.report))?
        .with_channel_errors(channel_errors))
}

/// Sweep every source x codec x probability, averaging `config.trials` runs each
pub fn run_sweep(sources: &[Source], config: &SweepConfig) -> Result<Vec<SweepSeries>> {
    let channels = config.channels()?;
    let mut series = Vec::with_capacity(sources.len() * config.codecs.len());

    for (source_index, source) in sources.iter().enumerate() {
        for (codec_index, &codec) in config.codecs.iter().enumerate() {
            let encoded = codec.encode(&source.data);
            let coded_bits = encoded.len() * 8;
            let mut points = Vec::with_capacity(channels.len());

            for (p_index, bsc) in channels.iter().enumerate() {
                let channel = ChannelModel::Bsc(*bsc);
                let trial = |trial_index: usize| {
                    let seed = trial_seed(
                        config.seed,
                        &[
                            source_index as u64,
                            codec_index as u64,
                            p_index as u64,
                            trial_index as u64,
                        ],
                    );
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    run_encoded_trial(&source.data, &encoded, codec, &channel, &mut rng)
                };

                // Collected in trial order either way, so the sums below match
                let reports: Vec<ErrorReport> = if config.parallel {
                    (0..config.trials).into_par_iter().map(trial).collect::<Result<_>>()?
                } else {
                    (0..config.trials).map(trial).collect::<Result<_>>()?
                };

                let point = average(bsc.probability(), coded_bits, &reports);
                log::debug!(
                    "{} / {} / p={:e}: ber={:e} over {} trials",
                    source.name,
                    codec.name(),
                    point.p,
                    point.mean_ber,
                    point.trials
                );
                points.push(point);
            }

            series.push(SweepSeries {
                source: source.name.clone(),
                codec,
                code_rate: codec.rate(),
                points,
            });
        }
    }

    Ok(series)
}

fn average(p: f64, coded_bits: usize, reports: &[ErrorReport]) -> SweepPoint {
    let trials = reports.len();
    let n = trials as f64;
    let mut ber = 0.0;
    let mut channel_ber = 0.0;
    let mut flagged = 0.0;
    let mut residual = 0;

    for report in reports {
        ber += report.bit_error_rate;
        if coded_bits > 0 {
            channel_ber += report.channel_bit_errors.unwrap_or(0) as f64 / coded_bits as f64;
        }
        flagged += report.flagged_blocks as f64;
        if report.has_residual_errors() {
            residual += 1;
        }
    }

    SweepPoint {
        p,
        trials,
        mean_ber: ber / n,
        mean_channel_ber: channel_ber / n,
        mean_flagged_blocks: flagged / n,
        trials_with_residual_errors: residual,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstUnit {
    Bits,
    Bytes,
}

impl BurstUnit {
    pub fn burst(&self, length: usize, offset: usize) -> Result<BurstChannel> {
        match self {
            BurstUnit::Bits => Ok(BurstChannel::new(length, offset)),
            BurstUnit::Bytes => BurstChannel::bytes(length, offset),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurstOutcome {
    pub length: usize,
    pub unit: BurstUnit,
    pub original_crc: u32,
    pub corrupted_crc: u32,
    /// The buffer changed and the CRC changed with it; a zero-length burst
    /// is neither corrupted nor detected
    pub detected: bool,
    pub corrupted: bool,
}

/// Corrupt the start of `data` with one burst per length and compare CRCs
pub fn crc_burst_experiment(
    data: &[u8],
    crc: &Crc,
    lengths: &[usize],
    unit: BurstUnit,
) -> Result<Vec<BurstOutcome>> {
    let original_crc = crc.checksum(data);
    lengths
        .iter()
        .map(|&length| {
            let corrupted = unit.burst(length, 0)?.apply(data)?;
            let corrupted_crc = crc.checksum(&corrupted);
            let changed = corrupted != data;
            Ok(BurstOutcome {
                length,
                unit,
                original_crc,
                corrupted_crc,
                detected: changed && corrupted_crc != original_crc,
                corrupted: changed,
            })
        })
        .collect()
}

/// A burst the CRC cannot see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrcCollision {
    /// Burst length in bits
    pub length: usize,
    /// Bit offset of the burst
    pub offset: usize,
    pub crc: u32,
}

/// Try bit bursts of each length at every offset until one leaves the CRC
/// unchanged. `None` means the search space held no blind spot.
pub fn find_crc_collision<I>(data: &[u8], crc: &Crc, lengths: I) -> Option<CrcCollision>
where
    I: IntoIterator<Item = usize>,
{
    let original = crc.checksum(data);
    let total_bits = data.len() * 8;

    for length in lengths {
        if length == 0 || length > total_bits {
            continue;
        }
        for offset in 0..=total_bits - length {
            let Ok(corrupted) = BurstChannel::new(length, offset).apply(data) else {
                continue;
            };
            if crc.checksum(&corrupted) == original {
                log::warn!(
                    "CRC {:#x} blind to {}-bit burst at offset {}",
                    original,
                    length,
                    offset
                );
                return Some(CrcCollision {
                    length,
                    offset,
                    crc: original,
                });
            }
        }
        log::debug!("no collision for {}-bit bursts", length);
    }

    None
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumOutcome {
    /// Burst length in bits
    pub burst_len: usize,
    pub trials: usize,
    pub detected: usize,
}

impl ChecksumOutcome {
    pub fn detection_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.detected as f64 / self.trials as f64
    }
}

/// Hit `data` with bursts at random offsets and count what the word checksum catches
pub fn checksum_experiment<R: Rng + ?Sized>(
    data: &[u8],
    burst_lengths: &[usize],
    trials: usize,
    rng: &mut R,
) -> Result<Vec<ChecksumOutcome>> {
    let expected = checksum::internet_checksum(data)?;
    let total_bits = data.len() * 8;
    let mut outcomes = Vec::with_capacity(burst_lengths.len());

    for &burst_len in burst_lengths {
        if burst_len > total_bits {
            return Err(ChannelCodeError::InvalidParameter(format!(
                "burst of {} bits exceeds {} bits",
                burst_len, total_bits
            )));
        }
        let mut detected = 0;
        for _ in 0..trials {
            let offset = rng.gen_range(0..=total_bits - burst_len);
            let corrupted = BurstChannel::new(burst_len, offset).apply(data)?;
            if !checksum::verify(&corrupted, expected)? {
                detected += 1;
            }
        }
        outcomes.push(ChecksumOutcome {
            burst_len,
            trials,
            detected,
        });
    }

    Ok(outcomes)
}
