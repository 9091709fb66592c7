//! Lock-free Control State
//!
//! Shared between the control thread (writes on user interaction), the audio
//! thread (reads every block in `refresh()`) and the UI thread (reads for the
//! response curve). Values live in atomic cells guarded by a sequence counter,
//! so readers always see every value from the same instant and the audio
//! thread never waits on a writer.

use std::hint;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::thread;

use ruckus_dsp::{log_spaced_frequencies, sample_response, ParameterSnapshot};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::params::{snapshot_from, ParameterId, ParameterSource, NUM_PARAMETERS};

/// Read attempts per [`ControlState::try_snapshot`] before giving up
const SNAPSHOT_RETRIES: usize = 8;

/// Current control values behind a sequence lock
///
/// Rust pattern: AtomicF64 doesn't exist, so values are stored as `f64` bit
/// patterns in `AtomicU64`.
pub struct ControlState {
    values: [AtomicU64; NUM_PARAMETERS],

    /// Odd while a write is in progress; advances by 2 per completed write
    sequence: AtomicU64,

    /// Sample rate published by the coordinator (0 until prepared)
    sample_rate_bits: AtomicU64,
}

impl ControlState {
    /// All parameters at their defaults
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| {
                AtomicU64::new(ParameterId::ALL[i].default_value().to_bits())
            }),
            sequence: AtomicU64::new(0),
            sample_rate_bits: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    /// Control state holding the values of `snapshot`
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Self {
        let state = Self::new();
        state.store_snapshot(snapshot);
        state
    }

    /// Mark a write in progress; spins while another writer holds the lock
    fn begin_write(&self) -> u64 {
        loop {
            let current = self.sequence.load(Ordering::Relaxed);
            if current % 2 == 0
                && self
                    .sequence
                    .compare_exchange_weak(current, current + 1, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                fence(Ordering::Release);
                return current;
            }
            hint::spin_loop();
        }
    }

    fn end_write(&self, start: u64) {
        self.sequence.store(start + 2, Ordering::Release);
    }

    pub fn set(&self, id: ParameterId, value: f64) {
        let start = self.begin_write();
        self.values[id.index()].store(value.to_bits(), Ordering::Relaxed);
        self.end_write(start);
    }

    /// Latest value of one parameter
    pub fn get(&self, id: ParameterId) -> f64 {
        f64::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Set a parameter by its host-facing name
    pub fn set_by_name(&self, name: &str, value: f64) -> EngineResult<()> {
        match ParameterId::from_name(name) {
            Some(id) => {
                self.set(id, value);
                Ok(())
            }
            None => {
                warn!("Unknown parameter: {}", name);
                Err(EngineError::UnknownParameter(name.to_string()))
            }
        }
    }

    /// Overwrite every value from `snapshot` (preset load, state restore)
    ///
    /// Readers see either all of the old values or all of the new ones. The
    /// next `refresh()` picks them up exactly like a live change.
    pub fn store_snapshot(&self, snapshot: &ParameterSnapshot) {
        let start = self.begin_write();
        for id in ParameterId::ALL {
            self.values[id.index()].store(id.value_in(snapshot).to_bits(), Ordering::Relaxed);
        }
        self.end_write(start);
        debug!("Control state replaced from snapshot");
    }

    /// Every value from one instant, or `None` if writers kept interfering
    ///
    /// # Real-time Safety
    /// Bounded: at most a fixed number of attempts, no allocation, no waiting.
    pub fn try_snapshot(&self) -> Option<ParameterSnapshot> {
        for _ in 0..SNAPSHOT_RETRIES {
            let start = self.sequence.load(Ordering::Acquire);
            if start % 2 == 0 {
                let snapshot = snapshot_from(|id| Some(self.get(id)));
                fence(Ordering::Acquire);
                if self.sequence.load(Ordering::Relaxed) == start {
                    return Some(snapshot);
                }
            }
            hint::spin_loop();
        }
        None
    }

    /// Every value from one instant, waiting out writers if needed
    ///
    /// Not for the audio thread; use [`ControlState::try_snapshot`] there.
    pub fn snapshot(&self) -> ParameterSnapshot {
        loop {
            if let Some(snapshot) = self.try_snapshot() {
                return snapshot;
            }
            thread::yield_now();
        }
    }

    /// Number of completed writes; lets pollers skip unchanged frames
    pub fn version(&self) -> u64 {
        self.sequence.load(Ordering::Acquire) / 2
    }

    pub fn set_sample_rate(&self, sample_rate: f64) {
        self.sample_rate_bits
            .store(sample_rate.to_bits(), Ordering::Relaxed);
    }

    /// Sample rate of the prepared stream, `None` before the first prepare
    pub fn sample_rate(&self) -> Option<f64> {
        let sample_rate = f64::from_bits(self.sample_rate_bits.load(Ordering::Relaxed));
        (sample_rate > 0.0).then_some(sample_rate)
    }

    /// Magnitude response in dB at `frequencies` for the current values
    ///
    /// Safe to call from a UI thread while audio is running. Returns `None`
    /// until a sample rate has been published.
    pub fn sample_response(&self, frequencies: &[f64]) -> Option<Vec<f64>> {
        let sample_rate = self.sample_rate()?;
        Some(sample_response(&self.snapshot(), sample_rate, frequencies))
    }

    /// Response curve over `points` log-spaced frequencies between `min_hz`
    /// and `max_hz`, as (frequency, dB) pairs
    pub fn response_curve(&self, points: usize, min_hz: f64, max_hz: f64) -> Option<Vec<(f64, f64)>> {
        let frequencies = log_spaced_frequencies(points, min_hz, max_hz);
        let magnitudes = self.sample_response(&frequencies)?;
        Some(frequencies.into_iter().zip(magnitudes).collect())
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSource for ControlState {
    fn parameter_value(&self, name: &str) -> Option<f64> {
        ParameterId::from_name(name).map(|id| self.get(id))
    }

    fn read_snapshot(&self) -> Option<ParameterSnapshot> {
        self.try_snapshot()
    }

    fn on_prepare(&self, sample_rate: f64) {
        self.set_sample_rate(sample_rate);
    }
}
