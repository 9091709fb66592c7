//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DspError {
    #[error(
        "Invalid filter parameters: frequency {frequency}Hz, Q {q} at sample rate {sample_rate}Hz"
    )]
    InvalidFilterParameters {
        frequency: f64,
        q: f64,
        sample_rate: f64,
    },

    #[error("Invalid filter order: {0} (must be 2, 4, 6 or 8 / 12, 24, 36 or 48 dB/oct)")]
    InvalidOrder(u32),

    #[error("Filter chain processed before prepare()")]
    UninitializedChain,
}
