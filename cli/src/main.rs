use channelcode_core::harness::{
    checksum_experiment, crc_burst_experiment, find_crc_collision, run_sweep, BurstUnit, Source,
    SweepConfig, SweepSeries, DEFAULT_BURST_LENGTHS, DEFAULT_CRC_BLOCK_BYTES,
};
use channelcode_core::{
    checksum, hamming_distance, BinarySymmetricChannel, ChannelModel, CodecKind, Crc, CrcParams,
    ErrorReport,
};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("No input data")]
    EmptyInput,
}

#[derive(Parser)]
#[command(name = "channelcode")]
#[command(about = "Channel coding experiments over simulated noisy links")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CodecArg {
    None,
    Repetition,
    Hamming,
}

impl From<CodecArg> for CodecKind {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::None => CodecKind::None,
            CodecArg::Repetition => CodecKind::Repetition3,
            CodecArg::Hamming => CodecKind::Hamming74,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Bits,
    Bytes,
}

impl From<UnitArg> for BurstUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Bits => BurstUnit::Bits,
            UnitArg::Bytes => BurstUnit::Bytes,
        }
    }
}

/// Accepts `0x`-prefixed hexadecimal or plain decimal
fn parse_number(value: &str) -> Result<u64, CliError> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => value.parse(),
    };
    parsed.map_err(|_| CliError::InvalidNumber(value.to_string()))
}

#[derive(Args)]
struct CrcArgs {
    /// Generator polynomial including its leading term
    #[arg(long, default_value = "0x104C11DB7", value_parser = parse_number)]
    poly: u64,

    /// Initial value, combined with --xor-out before the first byte
    #[arg(long, default_value = "0", value_parser = parse_number)]
    init: u64,

    #[arg(long, default_value = "0xFFFFFFFF", value_parser = parse_number)]
    xor_out: u64,

    /// Process bytes LSB first
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    reflected: bool,
}

impl CrcArgs {
    fn build(&self) -> Result<Crc, Box<dyn std::error::Error>> {
        let params = CrcParams::new(self.poly, self.init, self.xor_out, self.reflected)?;
        Ok(Crc::new(params)?)
    }
}

#[derive(Args)]
struct DataArgs {
    /// Read the test block from a file instead of generating it
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Size of the random test block
    #[arg(long, default_value_t = DEFAULT_CRC_BLOCK_BYTES)]
    random_bytes: usize,

    /// Seed for the random test block
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl DataArgs {
    fn load(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        match &self.input {
            Some(path) => Ok(std::fs::read(path)?),
            None => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                Ok((0..self.random_bytes).map(|_| rng.gen()).collect())
            }
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// BER against error probability for each file and codec
    Sweep {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Error probability (repeatable)
        #[arg(long = "p", value_name = "P")]
        probabilities: Vec<f64>,

        /// Codec to include (repeatable)
        #[arg(long = "codec", value_enum)]
        codecs: Vec<CodecArg>,

        #[arg(long)]
        trials: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Run trials on one thread
        #[arg(long)]
        serial: bool,

        /// JSON sweep configuration; flags override its values
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Encode a file, pass it through a binary symmetric channel and decode it
    Transmit {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[arg(long, value_enum, default_value = "hamming")]
        codec: CodecArg,

        #[arg(long = "p", default_value_t = 0.0)]
        probability: f64,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long)]
        json: bool,
    },

    /// Corrupt the start of a block with bursts and compare CRCs
    CrcBurst {
        #[command(flatten)]
        data: DataArgs,

        /// Burst length (repeatable)
        #[arg(long = "length", value_name = "L")]
        lengths: Vec<usize>,

        #[arg(long, value_enum, default_value = "bytes")]
        unit: UnitArg,

        #[command(flatten)]
        crc: CrcArgs,

        #[arg(long)]
        json: bool,
    },

    /// Search for a bit burst the CRC does not detect
    CrcCollision {
        #[command(flatten)]
        data: DataArgs,

        /// Longest burst to try, in bits
        #[arg(long, default_value_t = 40)]
        max_length: usize,

        #[command(flatten)]
        crc: CrcArgs,

        #[arg(long)]
        json: bool,
    },

    /// Print the ones'-complement word checksum of a file
    Checksum {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also measure detection of random bursts of this many bits (repeatable)
        #[arg(long = "burst", value_name = "BITS")]
        bursts: Vec<usize>,

        #[arg(long, default_value_t = 1000)]
        trials: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sweep {
            files,
            probabilities,
            codecs,
            trials,
            seed,
            serial,
            config,
            json,
        } => {
            let mut sweep = match config {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => SweepConfig::default(),
            };
            if !probabilities.is_empty() {
                sweep.probabilities = probabilities;
            }
            if !codecs.is_empty() {
                sweep.codecs = codecs.into_iter().map(CodecKind::from).collect();
            }
            if let Some(trials) = trials {
                sweep.trials = trials;
            }
            if let Some(seed) = seed {
                sweep.seed = seed;
            }
            if serial {
                sweep.parallel = false;
            }
            sweep_command(&files, &sweep, json)?
        }
        Commands::Transmit {
            input,
            output,
            codec,
            probability,
            seed,
            json,
        } => transmit_command(&input, &output, codec.into(), probability, seed, json)?,
        Commands::CrcBurst {
            data,
            lengths,
            unit,
            crc,
            json,
        } => {
            let lengths = if lengths.is_empty() {
                DEFAULT_BURST_LENGTHS.to_vec()
            } else {
                lengths
            };
            crc_burst_command(&data.load()?, &crc.build()?, &lengths, unit.into(), json)?
        }
        Commands::CrcCollision {
            data,
            max_length,
            crc,
            json,
        } => crc_collision_command(&data.load()?, &crc.build()?, max_length, json)?,
        Commands::Checksum {
            file,
            bursts,
            trials,
            seed,
        } => checksum_command(&file, &bursts, trials, seed)?,
    }

    Ok(())
}

fn sweep_command(
    files: &[PathBuf],
    config: &SweepConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let data = std::fs::read(path)?;
        log::info!("read {} bytes from {}", data.len(), path.display());
        sources.push(Source::new(path.display().to_string(), data));
    }

    let series = run_sweep(&sources, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
    } else {
        print_series(&series);
    }
    Ok(())
}

fn print_series(series: &[SweepSeries]) {
    for s in series {
        println!("{} [{}] rate {:.3}", s.source, s.codec.name(), s.code_rate);
        println!(
            "  {:>10}  {:>12}  {:>12}  {:>10}  {:>8}",
            "p", "BER", "channel BER", "flagged", "residual"
        );
        for point in &s.points {
            println!(
                "  {:>10.1e}  {:>12.4e}  {:>12.4e}  {:>10.1}  {:>4}/{:<3}",
                point.p,
                point.mean_ber,
                point.mean_channel_ber,
                point.mean_flagged_blocks,
                point.trials_with_residual_errors,
                point.trials
            );
        }
        println!();
    }
}

fn transmit_command(
    input: &Path,
    output: &Path,
    codec: CodecKind,
    probability: f64,
    seed: u64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    let channel = ChannelModel::Bsc(BinarySymmetricChannel::new(probability)?);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let encoded = codec.encode(&data);
    let received = channel.transmit(&encoded, &mut rng)?;
    let decoded = codec.decode(&received, data.len() * 8)?;
    std::fs::write(output, &decoded.bytes)?;

    let report = ErrorReport::compare(&data, &decoded.bytes, Some(&decoded.report))?
        .with_channel_errors(hamming_distance(&encoded, &received)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Read {} bytes from {}", data.len(), input.display());
        println!(
            "Encoded with {} to {} bytes, p = {}",
            codec.name(),
            encoded.len(),
            probability
        );
        println!(
            "Channel flipped {} bits, {} of {} blocks flagged",
            report.channel_bit_errors.unwrap_or(0),
            report.flagged_blocks,
            report.blocks
        );
        println!(
            "Residual bit errors: {} (BER {:.4e})",
            report.bit_errors, report.bit_error_rate
        );
        println!("Wrote {} bytes to {}", decoded.bytes.len(), output.display());
    }
    Ok(())
}

fn crc_burst_command(
    data: &[u8],
    crc: &Crc,
    lengths: &[usize],
    unit: BurstUnit,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if data.is_empty() {
        return Err(CliError::EmptyInput.into());
    }
    let outcomes = crc_burst_experiment(data, crc, lengths, unit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    let digits = (crc.width() as usize).div_ceil(4);
    for outcome in &outcomes {
        println!("L = {} {:?}", outcome.length, outcome.unit);
        println!("  CRC original:    {:0width$X}", outcome.original_crc, width = digits);
        println!("  CRC with errors: {:0width$X}", outcome.corrupted_crc, width = digits);
        if !outcome.corrupted {
            println!("  No errors introduced");
        } else if outcome.detected {
            println!("  Errors detected!");
        } else {
            println!("  Errors not detected!");
        }
    }
    Ok(())
}

fn crc_collision_command(
    data: &[u8],
    crc: &Crc,
    max_length: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if data.is_empty() {
        return Err(CliError::EmptyInput.into());
    }
    let collision = find_crc_collision(data, crc, 1..=max_length);
    if json {
        println!("{}", serde_json::to_string_pretty(&collision)?);
        return Ok(());
    }

    match collision {
        Some(c) => println!(
            "Undetected burst: {} bits at offset {} (CRC {:X})",
            c.length, c.offset, c.crc
        ),
        None => println!("No undetected burst up to {} bits", max_length),
    }
    Ok(())
}

fn checksum_command(
    path: &Path,
    bursts: &[usize],
    trials: usize,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = std::fs::read(path)?;
    if data.len() % 2 != 0 {
        log::info!("padding {} to an even length", path.display());
        data.push(0);
    }

    let value = checksum::internet_checksum(&data)?;
    println!("Checksum: {:04X}", value);

    if !bursts.is_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for outcome in checksum_experiment(&data, bursts, trials, &mut rng)? {
            println!(
                "  burst {:>3} bits: detected {}/{} ({:.2}%)",
                outcome.burst_len,
                outcome.detected,
                outcome.trials,
                outcome.detection_rate() * 100.0
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0x104C11DB7").unwrap(), 0x1_04C1_1DB7);
        assert_eq!(parse_number("0XFF").unwrap(), 255);
        assert_eq!(parse_number("0xFFFF_FFFF").unwrap(), 0xFFFF_FFFF);
        assert_eq!(parse_number("42").unwrap(), 42);
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("").is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
