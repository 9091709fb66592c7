//! Multi-Order Cut Filter
//!
//! Four cascaded biquad sections that together realize a 12, 24, 36 or
//! 48 dB/octave Butterworth high-pass or low-pass. A slope of `12 * k` dB/oct
//! enables the first `k` sections and bypasses the rest, so the active
//! sections are always a leading prefix.

use crate::coefficients::{butterworth, CutDesign, CutKind, MAX_CUT_SECTIONS};
use crate::error::DspError;
use crate::processor::FilterStage;
use crate::section::CascadedSection;
use crate::snapshot::{CutSettings, Slope};

#[derive(Debug, Clone)]
pub struct MultiOrderCutFilter {
    kind: CutKind,
    sections: [CascadedSection; MAX_CUT_SECTIONS],
    active: usize,
}

impl MultiOrderCutFilter {
    /// New filter with every section bypassed
    pub fn new(kind: CutKind) -> Self {
        let mut filter = Self {
            kind,
            sections: core::array::from_fn(|_| CascadedSection::default()),
            active: 0,
        };
        filter.bypass_all();
        filter
    }

    pub fn kind(&self) -> CutKind {
        self.kind
    }

    /// Design the Butterworth cascade for `settings` at `sample_rate`
    pub fn design(&self, settings: &CutSettings, sample_rate: f64) -> Result<CutDesign, DspError> {
        butterworth(self.kind, settings.frequency, sample_rate, settings.slope.order())
    }

    /// Assign a designed cascade: sections `0..k` get the coefficients in
    /// order and are enabled, the remaining sections are bypassed
    ///
    /// Coefficients and bypass flags change together, before the next sample.
    pub fn apply(&mut self, design: &CutDesign) {
        let coefficients = design.as_slice();
        for (index, section) in self.sections.iter_mut().enumerate() {
            match coefficients.get(index) {
                Some(c) => {
                    section.set_coefficients(*c);
                    section.set_bypassed(false);
                }
                None => section.set_bypassed(true),
            }
        }
        self.active = coefficients.len();
    }

    /// Recompute and assign coefficients for a new frequency / slope
    pub fn update(&mut self, settings: &CutSettings, sample_rate: f64) -> Result<(), DspError> {
        let design = self.design(settings, sample_rate)?;
        self.apply(&design);
        Ok(())
    }

    /// Unity passthrough: every section bypassed
    pub fn bypass_all(&mut self) {
        for section in self.sections.iter_mut() {
            section.set_bypassed(true);
        }
        self.active = 0;
    }

    /// Number of non-bypassed sections
    pub fn active_sections(&self) -> usize {
        self.active
    }

    /// Slope currently realized, `None` when fully bypassed
    pub fn slope(&self) -> Option<Slope> {
        self.active
            .checked_sub(1)
            .and_then(|index| Slope::ALL.get(index).copied())
    }

    pub fn sections(&self) -> &[CascadedSection; MAX_CUT_SECTIONS] {
        &self.sections
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let mut x = input;
        for section in self.sections.iter_mut() {
            x = section.process_sample(x);
        }
        x
    }

    pub fn reset(&mut self) {
        for section in self.sections.iter_mut() {
            section.reset();
        }
    }

    /// Product of every section's magnitude (bypassed sections count as 1)
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        self.sections
            .iter()
            .map(|s| s.magnitude_at(frequency, sample_rate))
            .product()
    }
}

impl FilterStage for MultiOrderCutFilter {
    fn process_sample(&mut self, input: f32) -> f32 {
        MultiOrderCutFilter::process_sample(self, input)
    }

    fn reset(&mut self) {
        MultiOrderCutFilter::reset(self);
    }

    /// Bypassing the whole filter disables every section; un-bypassing
    /// restores the prefix matching the last applied design.
    fn set_bypassed(&mut self, bypassed: bool) {
        let active = self.active;
        for (index, section) in self.sections.iter_mut().enumerate() {
            section.set_bypassed(bypassed || index >= active);
        }
    }

    fn is_bypassed(&self) -> bool {
        self.sections.iter().all(CascadedSection::is_bypassed)
    }

    fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        MultiOrderCutFilter::magnitude_at(self, frequency, sample_rate)
    }

    fn name(&self) -> &'static str {
        match self.kind {
            CutKind::HighPass => "High-Pass Cut",
            CutKind::LowPass => "Low-Pass Cut",
        }
    }
}
