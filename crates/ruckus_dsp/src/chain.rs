//! Channel Filter Chain
//!
//! The complete mono signal path:
//!
//! ```text
//! input ─▶ High-Pass Cut ─▶ Rumble ─▶ Low ─▶ LowMid ─▶ HighMid ─▶ High ─▶ Air ─▶ Low-Pass Cut ─▶ output
//! ```
//!
//! Each stage processes the previous stage's output. Coefficients are designed
//! once per snapshot as a [`ChainCoefficients`] value and then copied into the
//! chain, which lets the coordinator share a single design between channels.

use crate::coefficients::{
    butterworth, peaking_coefficients, BiquadCoefficients, CutDesign, CutKind,
};
use crate::cut_filter::MultiOrderCutFilter;
use crate::error::DspError;
use crate::processor::{FilterStage, ProcessSpec};
use crate::section::CascadedSection;
use crate::snapshot::{Band, ParameterSnapshot, NUM_BANDS};

/// Position of a stage inside the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainPosition {
    HighPass,
    Band(Band),
    LowPass,
}

impl ChainPosition {
    /// Every stage in processing order
    pub const ALL: [ChainPosition; NUM_BANDS + 2] = [
        ChainPosition::HighPass,
        ChainPosition::Band(Band::Rumble),
        ChainPosition::Band(Band::Low),
        ChainPosition::Band(Band::LowMid),
        ChainPosition::Band(Band::HighMid),
        ChainPosition::Band(Band::High),
        ChainPosition::Band(Band::Air),
        ChainPosition::LowPass,
    ];

    pub fn index(self) -> usize {
        match self {
            ChainPosition::HighPass => 0,
            ChainPosition::Band(band) => band.index() + 1,
            ChainPosition::LowPass => NUM_BANDS + 1,
        }
    }
}

/// Fully designed coefficient set for one snapshot at one sample rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub high_pass: CutDesign,
    pub bands: [BiquadCoefficients; NUM_BANDS],
    pub low_pass: CutDesign,
    pub sample_rate: f64,
    fallbacks: usize,
}

impl ChainCoefficients {
    /// Design every stage, failing on the first rejected parameter
    pub fn try_design(snapshot: &ParameterSnapshot, sample_rate: f64) -> Result<Self, DspError> {
        let high_pass = butterworth(
            CutKind::HighPass,
            snapshot.high_pass.frequency,
            sample_rate,
            snapshot.high_pass.slope.order(),
        )?;
        let low_pass = butterworth(
            CutKind::LowPass,
            snapshot.low_pass.frequency,
            sample_rate,
            snapshot.low_pass.slope.order(),
        )?;

        let mut bands = [BiquadCoefficients::IDENTITY; NUM_BANDS];
        for (coeffs, band) in bands.iter_mut().zip(snapshot.bands.iter()) {
            *coeffs = peaking_coefficients(band.frequency, band.q, band.gain_db, sample_rate)?;
        }

        Ok(Self {
            high_pass,
            bands,
            low_pass,
            sample_rate,
            fallbacks: 0,
        })
    }

    /// Design every stage, substituting unity passthrough for any stage
    /// whose parameters are rejected
    ///
    /// Never fails, so it is safe on the audio thread. The number of stages
    /// that fell back is available from [`ChainCoefficients::fallbacks`].
    pub fn design(snapshot: &ParameterSnapshot, sample_rate: f64) -> Self {
        let mut fallbacks = 0;

        let mut cut = |kind, frequency, order| {
            butterworth(kind, frequency, sample_rate, order).unwrap_or_else(|_| {
                fallbacks += 1;
                CutDesign::EMPTY
            })
        };
        let high_pass = cut(
            CutKind::HighPass,
            snapshot.high_pass.frequency,
            snapshot.high_pass.slope.order(),
        );
        let low_pass = cut(
            CutKind::LowPass,
            snapshot.low_pass.frequency,
            snapshot.low_pass.slope.order(),
        );

        let mut bands = [BiquadCoefficients::IDENTITY; NUM_BANDS];
        for (coeffs, band) in bands.iter_mut().zip(snapshot.bands.iter()) {
            match peaking_coefficients(band.frequency, band.q, band.gain_db, sample_rate) {
                Ok(c) => *coeffs = c,
                Err(_) => fallbacks += 1,
            }
        }

        Self {
            high_pass,
            bands,
            low_pass,
            sample_rate,
            fallbacks,
        }
    }

    /// Number of stages replaced by passthrough during design
    pub fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    /// Linear magnitude of the whole cascade at `frequency`
    pub fn magnitude_at(&self, frequency: f64) -> f64 {
        let bands: f64 = self
            .bands
            .iter()
            .map(|c| c.magnitude_at(frequency, self.sample_rate))
            .product();
        self.high_pass.magnitude_at(frequency, self.sample_rate)
            * bands
            * self.low_pass.magnitude_at(frequency, self.sample_rate)
    }
}

/// Per-channel filter chain
#[derive(Debug, Clone)]
pub struct ChannelFilterChain {
    high_pass: MultiOrderCutFilter,
    bands: [CascadedSection; NUM_BANDS],
    low_pass: MultiOrderCutFilter,
    spec: Option<ProcessSpec>,
}

impl ChannelFilterChain {
    /// Unprepared chain; call [`ChannelFilterChain::prepare`] before processing
    pub fn new() -> Self {
        Self {
            high_pass: MultiOrderCutFilter::new(CutKind::HighPass),
            bands: core::array::from_fn(|_| CascadedSection::default()),
            low_pass: MultiOrderCutFilter::new(CutKind::LowPass),
            spec: None,
        }
    }

    /// Reset all history to silence and prime coefficients from the default
    /// snapshot
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) -> Result<(), DspError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DspError::InvalidFilterParameters {
                frequency: 0.0,
                q: 0.0,
                sample_rate,
            });
        }

        self.spec = Some(ProcessSpec::new(sample_rate, max_block_size));
        self.reset();

        let baseline = ParameterSnapshot::default().clamped(sample_rate);
        self.apply(&ChainCoefficients::design(&baseline, sample_rate));
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.spec.is_some()
    }

    pub fn spec(&self) -> Option<ProcessSpec> {
        self.spec
    }

    /// Recompute and assign every stage's coefficients without touching the
    /// delay state
    ///
    /// Returns the number of stages that fell back to passthrough.
    pub fn update_from(&mut self, snapshot: &ParameterSnapshot) -> Result<usize, DspError> {
        let spec = self.spec.ok_or(DspError::UninitializedChain)?;
        let clamped = snapshot.clamped(spec.sample_rate);
        let coefficients = ChainCoefficients::design(&clamped, spec.sample_rate);
        self.apply(&coefficients);
        Ok(coefficients.fallbacks())
    }

    /// Copy a precomputed design into the chain
    pub fn apply(&mut self, coefficients: &ChainCoefficients) {
        self.high_pass.apply(&coefficients.high_pass);
        for (section, c) in self.bands.iter_mut().zip(coefficients.bands.iter()) {
            section.set_coefficients(*c);
        }
        self.low_pass.apply(&coefficients.low_pass);
    }

    /// Run one sample through every stage in order
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let mut x = self.high_pass.process_sample(input);
        for section in self.bands.iter_mut() {
            x = section.process_sample(x);
        }
        self.low_pass.process_sample(x)
    }

    /// Process a mono block in-place
    ///
    /// # Real-time Safety
    /// No allocations. O(n) where n = block length.
    pub fn process(&mut self, block: &mut [f32]) -> Result<(), DspError> {
        if self.spec.is_none() {
            return Err(DspError::UninitializedChain);
        }
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
        Ok(())
    }

    /// Clear every stage's history
    pub fn reset(&mut self) {
        self.high_pass.reset();
        for section in self.bands.iter_mut() {
            section.reset();
        }
        self.low_pass.reset();
    }

    pub fn stage(&self, position: ChainPosition) -> &dyn FilterStage {
        match position {
            ChainPosition::HighPass => &self.high_pass,
            ChainPosition::Band(band) => &self.bands[band.index()],
            ChainPosition::LowPass => &self.low_pass,
        }
    }

    pub fn stage_mut(&mut self, position: ChainPosition) -> &mut dyn FilterStage {
        match position {
            ChainPosition::HighPass => &mut self.high_pass,
            ChainPosition::Band(band) => &mut self.bands[band.index()],
            ChainPosition::LowPass => &mut self.low_pass,
        }
    }

    pub fn high_pass(&self) -> &MultiOrderCutFilter {
        &self.high_pass
    }

    pub fn band(&self, band: Band) -> &CascadedSection {
        &self.bands[band.index()]
    }

    pub fn low_pass(&self) -> &MultiOrderCutFilter {
        &self.low_pass
    }

    /// Magnitude of the live chain at `frequency`
    ///
    /// Reads the chain's own coefficients; UI code should use the response
    /// sampler instead so it never touches audio-thread objects.
    pub fn magnitude_at(&self, frequency: f64) -> Option<f64> {
        let spec = self.spec?;
        Some(
            ChainPosition::ALL
                .iter()
                .map(|p| self.stage(*p).magnitude_at(frequency, spec.sample_rate))
                .product(),
        )
    }
}

impl Default for ChannelFilterChain {
    fn default() -> Self {
        Self::new()
    }
}
