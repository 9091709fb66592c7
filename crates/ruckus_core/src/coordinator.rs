//! Chain Coordinator
//!
//! Owns one [`ChannelFilterChain`] per channel and is the single source of
//! truth for what the chain should currently sound like.
//!
//! # Block discipline
//!
//! ```text
//! host block ─▶ refresh() ─▶ snapshot ─▶ design once ─▶ copy to every channel ─▶ process()
//! ```
//!
//! `refresh()` re-reads every control value unconditionally. Recomputing
//! identical coefficients is harmless, and it keeps the audio thread free of
//! change-notification plumbing.

use ruckus_dsp::{ChainCoefficients, ChannelFilterChain, DspError, ParameterSnapshot};
use tracing::{debug, info, warn};

use crate::config::StreamConfig;
use crate::error::{EngineError, EngineResult};
use crate::params::ParameterSource;

pub struct ChainCoordinator<S: ParameterSource> {
    source: S,
    channels: usize,
    chains: Vec<ChannelFilterChain>,
    config: Option<StreamConfig>,

    /// Last applied (clamped) snapshot
    snapshot: ParameterSnapshot,

    /// Stages that fell back to passthrough since `prepare()`
    fallbacks: u64,
}

impl<S: ParameterSource> ChainCoordinator<S> {
    /// Coordinator for `channels` independent mono chains
    ///
    /// Nothing is allocated until [`ChainCoordinator::prepare`].
    pub fn new(source: S, channels: usize) -> Self {
        Self {
            source,
            channels,
            chains: Vec::new(),
            config: None,
            snapshot: ParameterSnapshot::default(),
            fallbacks: 0,
        }
    }

    /// (Re)build every channel chain for a new stream
    ///
    /// Resets all filter history and primes coefficients from the current
    /// control values. Call on start-up and whenever the sample rate or block
    /// size changes; never from the audio callback.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> EngineResult<()> {
        let config = StreamConfig {
            sample_rate,
            channels: self.channels,
            max_block_size,
        };
        config.validate()?;

        let mut chains = Vec::with_capacity(self.channels);
        for _ in 0..self.channels {
            let mut chain = ChannelFilterChain::new();
            chain.prepare(sample_rate, max_block_size)?;
            chains.push(chain);
        }

        self.chains = chains;
        self.config = Some(config);
        self.fallbacks = 0;
        self.source.on_prepare(sample_rate);

        info!(
            "Filter chain prepared: {} Hz, {} channel(s), {} samples max ({:.2} ms)",
            sample_rate,
            self.channels,
            max_block_size,
            config.latency_ms()
        );

        self.refresh();
        Ok(())
    }

    /// Drop the channel chains; `process()` fails until the next `prepare()`
    pub fn release(&mut self) {
        if self.fallbacks > 0 {
            warn!(
                "{} filter stage(s) fell back to passthrough during this session",
                self.fallbacks
            );
        }
        self.chains.clear();
        self.config = None;
        info!("Filter chain released");
    }

    pub fn is_prepared(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> Option<&StreamConfig> {
        self.config.as_ref()
    }

    /// Read the current control values and apply them to every channel
    ///
    /// Call once per block, before `process()`. Bounded time, no allocation,
    /// no locks. If the source cannot produce a consistent snapshot in time,
    /// the previous coefficients stay in place for this block. Before
    /// `prepare()` only the stored snapshot is updated.
    pub fn refresh(&mut self) {
        if let Some(snapshot) = self.source.read_snapshot() {
            self.apply_snapshot(&snapshot);
        }
    }

    /// Apply `snapshot` to every channel
    ///
    /// This is the only path by which coefficients change: live control
    /// changes (via `refresh()`) and restored state both go through here.
    /// Coefficients are designed once and copied, so all channels carry
    /// bit-identical filters.
    pub fn apply_snapshot(&mut self, snapshot: &ParameterSnapshot) {
        let Some(config) = self.config else {
            self.snapshot = *snapshot;
            return;
        };

        let clamped = snapshot.clamped(config.sample_rate);
        let coefficients = ChainCoefficients::design(&clamped, config.sample_rate);
        for chain in self.chains.iter_mut() {
            chain.apply(&coefficients);
        }

        self.fallbacks += coefficients.fallbacks() as u64;
        self.snapshot = clamped;
    }

    /// Restore persisted state: identical to a live change, but logged
    ///
    /// Not for the audio thread.
    pub fn restore_snapshot(&mut self, snapshot: &ParameterSnapshot) {
        debug!("Restoring snapshot: {:?}", snapshot);
        self.apply_snapshot(snapshot);
    }

    /// Run one block through every channel
    ///
    /// `channels[i]` is processed in-place by chain `i`.
    ///
    /// # Real-time Safety
    /// No allocations, no locks. O(channels × samples).
    pub fn process(&mut self, channels: &mut [&mut [f32]]) -> EngineResult<()> {
        let config = self
            .config
            .ok_or(EngineError::Dsp(DspError::UninitializedChain))?;

        if channels.len() != self.chains.len() {
            return Err(EngineError::ChannelMismatch {
                expected: self.chains.len(),
                got: channels.len(),
            });
        }
        if let Some(block) = channels
            .iter()
            .find(|block| block.len() > config.max_block_size)
        {
            return Err(EngineError::BlockTooLarge {
                max: config.max_block_size,
                got: block.len(),
            });
        }

        for (chain, block) in self.chains.iter_mut().zip(channels.iter_mut()) {
            chain.process(block)?;
        }
        Ok(())
    }

    /// `refresh()` followed by `process()`: the per-block host entry point
    pub fn process_block(&mut self, channels: &mut [&mut [f32]]) -> EngineResult<()> {
        self.refresh();
        self.process(channels)
    }

    /// Last applied snapshot (clamped once prepared)
    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.snapshot
    }

    pub fn num_channels(&self) -> usize {
        self.channels
    }

    pub fn chain(&self, channel: usize) -> Option<&ChannelFilterChain> {
        self.chains.get(channel)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Stages that fell back to passthrough since the last `prepare()`
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlState;
    use crate::params::ParameterId;
    use ruckus_dsp::{gain_to_db, Band, BandSettings, ChainPosition, CutSettings, Slope};
    use std::f64::consts::PI;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    const FS: f64 = 44100.0;
    const BLOCK: usize = 512;

    fn reference_state() -> Arc<ControlState> {
        let state = Arc::new(ControlState::new());
        state.set(ParameterId::HighPassFreq, 75.0);
        state.set(ParameterId::HighPassSlope, 0.0);
        state.set(ParameterId::LowPassFreq, 21000.0);
        state.set(ParameterId::LowPassSlope, 0.0);
        state
    }

    fn stereo(state: &Arc<ControlState>) -> ChainCoordinator<Arc<ControlState>> {
        let mut coordinator = ChainCoordinator::new(Arc::clone(state), 2);
        coordinator.prepare(FS, BLOCK).unwrap();
        coordinator
    }

    fn sine(freq: f64, n: usize, offset: usize) -> Vec<f32> {
        (offset..offset + n)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin() as f32)
            .collect()
    }

    fn peak(block: &[f32]) -> f32 {
        block.iter().fold(0.0_f32, |acc, x| acc.max(x.abs()))
    }

    #[test]
    fn test_process_before_prepare_fails() {
        let mut coordinator = ChainCoordinator::new(ControlState::new(), 2);
        let mut left = vec![0.5; 8];
        let mut right = vec![0.5; 8];
        let result = coordinator.process(&mut [&mut left[..], &mut right[..]]);
        assert!(matches!(
            result,
            Err(EngineError::Dsp(DspError::UninitializedChain))
        ));
        assert!(left.iter().all(|x| *x == 0.5));
    }

    #[test]
    fn test_prepare_validates_config() {
        let mut coordinator = ChainCoordinator::new(ControlState::new(), 2);
        assert!(matches!(
            coordinator.prepare(0.0, BLOCK),
            Err(EngineError::ConfigError(_))
        ));
        assert!(coordinator.prepare(FS, 0).is_err());
        assert!(!coordinator.is_prepared());

        let mut none = ChainCoordinator::new(ControlState::new(), 0);
        assert!(none.prepare(FS, BLOCK).is_err());
    }

    #[test]
    fn test_prepare_publishes_sample_rate() {
        let state = reference_state();
        let coordinator = stereo(&state);
        assert_eq!(state.sample_rate(), Some(FS));
        assert_eq!(coordinator.config().unwrap().max_block_size, BLOCK);
        assert_eq!(coordinator.snapshot().high_pass.frequency, 75.0);
    }

    #[test]
    fn test_channel_and_block_checks() {
        let state = reference_state();
        let mut coordinator = stereo(&state);

        let mut mono = vec![0.0; 16];
        assert!(matches!(
            coordinator.process(&mut [&mut mono[..]]),
            Err(EngineError::ChannelMismatch { expected: 2, got: 1 })
        ));

        let mut left = vec![0.0; BLOCK + 1];
        let mut right = vec![0.0; BLOCK + 1];
        assert!(matches!(
            coordinator.process(&mut [&mut left[..], &mut right[..]]),
            Err(EngineError::BlockTooLarge { max: BLOCK, got }) if got == BLOCK + 1
        ));
    }

    #[test]
    fn test_passband_transparency_end_to_end() {
        let state = reference_state();
        let mut coordinator = stereo(&state);

        let mut last_left = Vec::new();
        let mut last_right = Vec::new();
        for block in 0..10 {
            let mut left = sine(1000.0, BLOCK, block * BLOCK);
            let mut right = left.clone();
            coordinator
                .process_block(&mut [&mut left[..], &mut right[..]])
                .unwrap();
            last_left = left;
            last_right = right;
        }

        let db = gain_to_db(peak(&last_left) as f64);
        assert!(db.abs() < 0.1, "1 kHz should pass unchanged, got {db} dB");
        assert_eq!(last_left, last_right);
    }

    #[test]
    fn test_stereo_channels_track_exactly() {
        let state = reference_state();
        state.set(ParameterId::HighPassSlope, 3.0);
        state.set(ParameterId::BandGain(Band::HighMid), -9.0);
        let mut coordinator = stereo(&state);

        for block in 0..4 {
            // Control change between blocks
            state.set(ParameterId::BandFreq(Band::HighMid), 1000.0 + 250.0 * block as f64);

            let mut left = sine(330.0, BLOCK, block * BLOCK);
            let mut right = left.clone();
            coordinator
                .process_block(&mut [&mut left[..], &mut right[..]])
                .unwrap();
            assert_eq!(left, right);
        }

        let left = coordinator.chain(0).unwrap();
        let right = coordinator.chain(1).unwrap();
        for position in ChainPosition::ALL {
            assert_eq!(
                left.stage(position).magnitude_at(500.0, FS).to_bits(),
                right.stage(position).magnitude_at(500.0, FS).to_bits()
            );
        }
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let state = reference_state();
        state.set(ParameterId::BandGain(Band::Low), 4.0);
        let mut coordinator = stereo(&state);

        let mut left = sine(200.0, BLOCK, 0);
        let mut right = left.clone();
        coordinator
            .process(&mut [&mut left[..], &mut right[..]])
            .unwrap();

        let before = coordinator.chain(0).unwrap().clone();
        coordinator.refresh();
        coordinator.refresh();
        let after = coordinator.chain(0).unwrap();

        for band in Band::ALL {
            assert_eq!(before.band(band).coefficients(), after.band(band).coefficients());
            assert_eq!(before.band(band).history(), after.band(band).history());
        }
    }

    #[test]
    fn test_slope_change_reaches_every_channel() {
        let state = reference_state();
        let mut coordinator = stereo(&state);
        assert_eq!(coordinator.chain(0).unwrap().high_pass().active_sections(), 1);

        state.set_by_name("HighPass Slope", 2.0).unwrap();
        coordinator.refresh();
        for channel in 0..2 {
            let chain = coordinator.chain(channel).unwrap();
            assert_eq!(chain.high_pass().active_sections(), 3);
            assert_eq!(chain.low_pass().active_sections(), 1);
        }
    }

    #[test]
    fn test_restore_matches_live_change() {
        let target = ParameterSnapshot::default()
            .with_band(Band::Low, BandSettings::new(250.0, 6.0, 1.0))
            .with_high_pass(CutSettings::new(75.0, Slope::Db24))
            .with_low_pass(CutSettings::new(18000.0, Slope::Db36));

        // Live: through the control state
        let live_state = Arc::new(ControlState::new());
        let mut live = ChainCoordinator::new(Arc::clone(&live_state), 1);
        live.prepare(FS, BLOCK).unwrap();
        live_state.store_snapshot(&target);
        live.refresh();

        // Restored: handed straight to the coordinator
        let mut restored = ChainCoordinator::new(ControlState::new(), 1);
        restored.prepare(FS, BLOCK).unwrap();
        restored.restore_snapshot(&target);

        assert_eq!(live.snapshot(), restored.snapshot());
        let mut a = sine(250.0, BLOCK, 0);
        let mut b = a.clone();
        live.process(&mut [&mut a[..]]).unwrap();
        restored.process(&mut [&mut b[..]]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_is_clamped_to_nyquist() {
        let state = Arc::new(ControlState::new());
        state.set(ParameterId::LowPassFreq, 22000.0);
        state.set(ParameterId::BandFreq(Band::Air), 22000.0);

        let mut coordinator = ChainCoordinator::new(Arc::clone(&state), 1);
        coordinator.prepare(32000.0, BLOCK).unwrap();

        assert!(coordinator.snapshot().low_pass.frequency < 16000.0);
        assert!(coordinator.snapshot().band(Band::Air).frequency < 16000.0);
        assert_eq!(coordinator.fallback_count(), 0);
    }

    #[test]
    fn test_apply_before_prepare_only_stores() {
        let mut coordinator = ChainCoordinator::new(ControlState::new(), 2);
        let snapshot =
            ParameterSnapshot::default().with_band(Band::Air, BandSettings::new(10000.0, 3.0, 2.0));
        coordinator.apply_snapshot(&snapshot);
        assert_eq!(coordinator.snapshot(), &snapshot);
        assert!(coordinator.chain(0).is_none());
    }

    #[test]
    fn test_release_and_reprepare() {
        let state = reference_state();
        let mut coordinator = stereo(&state);
        coordinator.release();
        assert!(!coordinator.is_prepared());

        let mut left = vec![0.0; 8];
        let mut right = vec![0.0; 8];
        assert!(coordinator
            .process(&mut [&mut left[..], &mut right[..]])
            .is_err());

        coordinator.prepare(96000.0, 256).unwrap();
        assert_eq!(state.sample_rate(), Some(96000.0));
        assert!(coordinator
            .process(&mut [&mut left[..], &mut right[..]])
            .is_ok());
    }

    #[test]
    fn test_refresh_sees_whole_preset_loads() {
        let a = ParameterSnapshot::default()
            .with_band_gains([6.0, 0.0, -3.0, 0.0, 2.0, 0.0])
            .with_high_pass(CutSettings::new(100.0, Slope::Db36));
        let b = ParameterSnapshot::default()
            .with_band_gains([-6.0, 4.0, 0.0, -8.0, 0.0, 5.0])
            .with_low_pass(CutSettings::new(12000.0, Slope::Db24));

        let state = Arc::new(ControlState::from_snapshot(&a));
        let mut coordinator = stereo(&state);
        let done = Arc::new(AtomicBool::new(false));

        let loader = {
            let state = Arc::clone(&state);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut flip = false;
                while !done.load(Ordering::Relaxed) {
                    state.store_snapshot(if flip { &a } else { &b });
                    flip = !flip;
                }
            })
        };

        let expected = [a.clamped(FS), b.clamped(FS)];
        for block in 0..2000 {
            let mut left = sine(700.0, 64, block * 64);
            let mut right = left.clone();
            coordinator
                .process_block(&mut [&mut left[..], &mut right[..]])
                .unwrap();
            assert!(expected.contains(coordinator.snapshot()));
        }

        done.store(true, Ordering::Relaxed);
        loader.join().unwrap();
    }

    #[test]
    fn test_control_thread_runs_alongside_audio() {
        let state = reference_state();
        let mut coordinator = stereo(&state);

        let control = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for i in 0..500 {
                    let gain = (i % 49) as f64 - 24.0;
                    state.set(ParameterId::BandGain(Band::LowMid), gain);
                    state.set(ParameterId::LowPassSlope, (i % 4) as f64);
                }
            })
        };
        let ui = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..50 {
                    let curve = state.response_curve(128, 20.0, 20000.0).unwrap();
                    assert!(curve.iter().all(|(_, db)| db.is_finite()));
                }
            })
        };

        for block in 0..50 {
            let mut left = sine(500.0, BLOCK, block * BLOCK);
            let mut right = left.clone();
            coordinator
                .process_block(&mut [&mut left[..], &mut right[..]])
                .unwrap();
            assert!(left.iter().all(|x| x.is_finite()));
            assert_eq!(left, right);
        }

        control.join().unwrap();
        ui.join().unwrap();
    }

    #[test]
    fn test_low_band_response_end_to_end() {
        let state = reference_state();
        state.set_by_name("Low Freq", 250.0).unwrap();
        state.set_by_name("Low Gain", 6.0).unwrap();
        state.set_by_name("Low Q", 1.0).unwrap();
        let _coordinator = stereo(&state);

        let db = state.sample_response(&[250.0, 20000.0]).unwrap();
        assert!((db[0] - 6.0).abs() <= 0.2, "250 Hz: {}", db[0]);
        assert!(db[1].abs() <= 0.5, "20 kHz: {}", db[1]);
    }
}
