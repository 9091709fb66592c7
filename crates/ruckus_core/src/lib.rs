//! Ruckus Core - Chain Coordination
//!
//! This crate connects the host's control values to the DSP chain:
//! - The parameter catalogue and the [`ParameterSource`] seam
//! - A lock-free [`ControlState`] shared by control, audio and UI threads
//! - The [`ChainCoordinator`] that keeps every channel's chain in sync
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Control / UI Threads                        │
//! │   set(id, value) ──▶ ControlState ◀── sample_response()     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ atomics (no locks)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   refresh() ──▶ snapshot ──▶ design once ──▶ L/R chains     │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod control;
mod coordinator;
mod error;
mod params;

pub use config::StreamConfig;
pub use control::ControlState;
pub use coordinator::ChainCoordinator;
pub use error::{EngineError, EngineResult};
pub use params::{
    build_snapshot, snapshot_from, ParameterId, ParameterRange, ParameterSource, NUM_PARAMETERS,
};

// Re-export DSP types for convenience
pub use ruckus_dsp::{
    Band, BandSettings, CutSettings, DspError, ParameterSnapshot, Slope, NUM_BANDS,
};

use tracing_subscriber::EnvFilter;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "ruckus_core=info,ruckus_dsp=info";

/// Install a `tracing` subscriber for hosts and tools that don't bring one
///
/// Honours `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`]. Does nothing if
/// a global subscriber is already set.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
