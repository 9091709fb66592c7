//! Stream Configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Shape of the audio stream the coordinator is prepared for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: f64,

    /// Number of independent mono chains (1 = mono, 2 = stereo)
    pub channels: usize,

    /// Largest block the host will pass to `process()`, in samples
    pub max_block_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            channels: 2,
            max_block_size: 512,
        }
    }
}

impl StreamConfig {
    /// Block latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f64 {
        (self.max_block_size as f64 / self.sample_rate) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(EngineError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 || self.channels > 8 {
            return Err(EngineError::ConfigError(format!(
                "Invalid channel count: {}",
                self.channels
            )));
        }
        if self.max_block_size == 0 || self.max_block_size > 16384 {
            return Err(EngineError::ConfigError(format!(
                "Invalid block size: {}",
                self.max_block_size
            )));
        }
        Ok(())
    }
}
