//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the chain coordinator
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("DSP error: {0}")]
    Dsp(#[from] ruckus_dsp::DspError),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Channel count mismatch: expected {expected}, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("Block of {got} samples exceeds prepared maximum of {max}")]
    BlockTooLarge { max: usize, got: usize },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
