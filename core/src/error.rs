use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelCodeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Length mismatch: {left} bytes vs {right} bytes")]
    LengthMismatch { left: usize, right: usize },

    /// Word checksum input must hold a whole number of 16-bit words
    #[error("Invalid length: {len} bytes is not a multiple of 2")]
    InvalidLength { len: usize },

    #[error("Uncorrectable block at index {block}")]
    UncorrectableBlock { block: usize },

    #[error("Transport has no pending data")]
    TransportClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChannelCodeError>;
