//! Ruckus DSP - Digital Signal Processing Module
//!
//! This crate provides the filter chain of the Ruckus equalizer:
//! - RBJ cookbook peaking bands and Butterworth cut filters (via `biquad`)
//! - Cascaded biquad sections with click-free coefficient swaps
//! - 12/24/36/48 dB/oct cut filters built from up to four sections
//! - A fixed per-channel chain: high-pass → six bands → low-pass
//! - A coefficient-only response sampler for drawing the EQ curve
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Coefficients are designed once per block from an immutable
//! [`ParameterSnapshot`] and copied into the chain between blocks; the filter
//! history is never reset by a parameter change.

mod chain;
mod coefficients;
mod cut_filter;
mod error;
mod presets;
mod processor;
mod response;
mod section;
mod snapshot;

pub use chain::{ChainCoefficients, ChainPosition, ChannelFilterChain};
pub use coefficients::{
    butterworth, butterworth_high_pass, butterworth_low_pass, db_to_gain, gain_to_db,
    peaking_coefficients, sections_for_order, BiquadCoefficients, CutDesign, CutKind,
    MAX_CUT_SECTIONS,
};
pub use cut_filter::MultiOrderCutFilter;
pub use error::DspError;
pub use presets::{apply_preset, find_preset, Preset, PRESETS};
pub use processor::{FilterStage, ProcessSpec};
pub use response::{
    log_spaced_frequencies, sample_response, sample_response_into, DISPLAY_MAX_HZ, DISPLAY_MIN_HZ,
};
pub use section::CascadedSection;
pub use snapshot::{
    Band, BandSettings, CutSettings, ParameterSnapshot, Slope, FREQUENCY_RANGE, GAIN_RANGE,
    NUM_BANDS, NYQUIST_MARGIN, Q_RANGE,
};
