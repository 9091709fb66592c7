//! Filter Stage Trait
//!
//! Defines the interface shared by every stage of the channel chain, so the
//! chain can be addressed by position at runtime (cut filters and parametric
//! sections alike).

/// Stream metadata handed to `prepare()`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    pub max_block_size: usize,
}

impl ProcessSpec {
    pub fn new(sample_rate: f64, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
        }
    }

    /// Highest frequency a filter may be designed at for this stream
    pub fn nyquist(&self) -> f64 {
        self.sample_rate * 0.5
    }
}

/// A stage of the filter chain
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process_sample()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - Constant time per sample
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait FilterStage: Send {
    /// Process one mono sample
    fn process_sample(&mut self, input: f32) -> f32;

    /// Clear internal history
    fn reset(&mut self);

    fn set_bypassed(&mut self, bypassed: bool);

    fn is_bypassed(&self) -> bool;

    /// Linear magnitude at `frequency` given the stage's current coefficients
    fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64;

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;

    /// Process a mono block in-place
    fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}
