//! Cascaded Section
//!
//! A single second-order IIR stage running the `biquad` crate's Direct Form II
//! Transposed filter in `f64`. Coefficients can be swapped at any time without
//! touching the state registers, so parameter changes never reset the filter
//! history.

use biquad::{Biquad, Coefficients, DirectForm2Transposed};

use crate::coefficients::BiquadCoefficients;
use crate::processor::FilterStage;

/// State values below this are flushed to zero to stop denormals from
/// creeping through the feedback path
const DENORMAL_THRESHOLD: f64 = 1.0e-25;

#[inline(always)]
fn flush_denormal(value: f64) -> f64 {
    if value.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        value
    }
}

/// One biquad stage with its own coefficients, state and bypass flag
#[derive(Debug, Clone)]
pub struct CascadedSection {
    coefficients: BiquadCoefficients,
    filter: DirectForm2Transposed<f64>,
    bypassed: bool,
}

impl CascadedSection {
    pub fn new(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            filter: DirectForm2Transposed::<f64>::new(Coefficients::from(coefficients)),
            bypassed: false,
        }
    }

    /// Replace the transfer function, keeping the state registers
    #[inline]
    pub fn set_coefficients(&mut self, coefficients: BiquadCoefficients) {
        self.coefficients = coefficients;
        self.filter.update_coefficients(Coefficients::from(coefficients));
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Run one sample through the filter
    ///
    /// # Real-time Safety
    /// No allocations, no branches beyond the bypass check and denormal flush.
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        if self.bypassed {
            return input;
        }

        let output = self.filter.run(input as f64);
        self.filter.s1 = flush_denormal(self.filter.s1);
        self.filter.s2 = flush_denormal(self.filter.s2);

        output as f32
    }

    /// Bypassed sections are the identity and leave their history untouched
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Clear the state registers
    pub fn reset(&mut self) {
        self.filter.reset_state();
    }

    /// State registers as (s1, s2)
    pub fn history(&self) -> (f64, f64) {
        (self.filter.s1, self.filter.s2)
    }

    /// Magnitude at `frequency`; 1.0 when bypassed
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        if self.bypassed {
            1.0
        } else {
            self.coefficients.magnitude_at(frequency, sample_rate)
        }
    }
}

impl Default for CascadedSection {
    fn default() -> Self {
        Self::new(BiquadCoefficients::IDENTITY)
    }
}

impl FilterStage for CascadedSection {
    fn process_sample(&mut self, input: f32) -> f32 {
        CascadedSection::process_sample(self, input)
    }

    fn reset(&mut self) {
        CascadedSection::reset(self);
    }

    fn set_bypassed(&mut self, bypassed: bool) {
        CascadedSection::set_bypassed(self, bypassed);
    }

    fn is_bypassed(&self) -> bool {
        CascadedSection::is_bypassed(self)
    }

    fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        CascadedSection::magnitude_at(self, frequency, sample_rate)
    }

    fn name(&self) -> &'static str {
        "Biquad Section"
    }
}
