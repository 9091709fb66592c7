//! Coefficient Calculator
//!
//! Pure functions that turn filter parameters into normalized biquad
//! coefficients. The prototypes are the RBJ (Robert Bristow-Johnson) Audio EQ
//! Cookbook designs provided by the `biquad` crate; this module adds the input
//! validation and the Butterworth cascade layout on top.
//!
//! Nothing here allocates, so every function is safe to call from the audio
//! thread once the caller has clamped its inputs.

use std::f64::consts::PI;

use biquad::{Coefficients, Hertz, Type};

use crate::error::DspError;

/// Maximum number of second-order sections a cut filter can use (48 dB/oct)
pub const MAX_CUT_SECTIONS: usize = 4;

/// Normalized second-order transfer function (a0 == 1)
///
/// ```text
///        b0 + b1*z^-1 + b2*z^-2
/// H(z) = ----------------------
///         1 + a1*z^-1 + a2*z^-2
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    /// Unity-gain passthrough
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Magnitude of H(e^jω) at `frequency`
    ///
    /// Evaluated with z^-1 = cos(ω) - j*sin(ω), ω = 2πf/fs.
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * frequency / sample_rate;
        let (sin_w, cos_w) = omega.sin_cos();
        let (sin_2w, cos_2w) = (2.0 * omega).sin_cos();

        let num_real = self.b0 + self.b1 * cos_w + self.b2 * cos_2w;
        let num_imag = -self.b1 * sin_w - self.b2 * sin_2w;

        let den_real = 1.0 + self.a1 * cos_w + self.a2 * cos_2w;
        let den_imag = -self.a1 * sin_w - self.a2 * sin_2w;

        let num_mag_sq = num_real * num_real + num_imag * num_imag;
        let den_mag_sq = den_real * den_real + den_imag * den_imag;

        (num_mag_sq / den_mag_sq).sqrt()
    }

    /// True when both poles lie strictly inside the unit circle
    ///
    /// Uses the stability triangle: |a2| < 1 and |a1| < 1 + a2.
    pub fn is_stable(&self) -> bool {
        let finite = [self.b0, self.b1, self.b2, self.a1, self.a2]
            .iter()
            .all(|c| c.is_finite());
        finite && self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Coefficients<f64>> for BiquadCoefficients {
    fn from(c: Coefficients<f64>) -> Self {
        Self {
            b0: c.b0,
            b1: c.b1,
            b2: c.b2,
            a1: c.a1,
            a2: c.a2,
        }
    }
}

impl From<BiquadCoefficients> for Coefficients<f64> {
    fn from(c: BiquadCoefficients) -> Self {
        Coefficients {
            a1: c.a1,
            a2: c.a2,
            b0: c.b0,
            b1: c.b1,
            b2: c.b2,
        }
    }
}

/// Which side of the spectrum a cut filter removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    HighPass,
    LowPass,
}

/// Ordered coefficient list produced by a Butterworth design
///
/// Fixed capacity so designing a cut filter never touches the heap.
/// Section 0 is the first section returned by the designer (lowest Q).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutDesign {
    sections: [BiquadCoefficients; MAX_CUT_SECTIONS],
    len: usize,
}

impl CutDesign {
    /// Empty design (every cut section bypassed)
    pub const EMPTY: Self = Self {
        sections: [BiquadCoefficients::IDENTITY; MAX_CUT_SECTIONS],
        len: 0,
    };

    pub fn as_slice(&self) -> &[BiquadCoefficients] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Product of every section's magnitude at `frequency`
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        self.as_slice()
            .iter()
            .map(|c| c.magnitude_at(frequency, sample_rate))
            .product()
    }
}

impl Default for CutDesign {
    fn default() -> Self {
        Self::EMPTY
    }
}

fn invalid(frequency: f64, q: f64, sample_rate: f64) -> DspError {
    DspError::InvalidFilterParameters {
        frequency,
        q,
        sample_rate,
    }
}

/// Reject anything that would make the RBJ formulas produce NaN or poles on
/// or outside the unit circle.
fn validate(frequency: f64, q: f64, sample_rate: f64) -> Result<(), DspError> {
    let all_finite = frequency.is_finite() && q.is_finite() && sample_rate.is_finite();
    if !all_finite || sample_rate <= 0.0 || frequency <= 0.0 || q <= 0.0 {
        return Err(invalid(frequency, q, sample_rate));
    }
    if frequency >= sample_rate * 0.5 {
        return Err(invalid(frequency, q, sample_rate));
    }
    Ok(())
}

fn design(
    filter: Type<f64>,
    frequency: f64,
    q: f64,
    sample_rate: f64,
) -> Result<BiquadCoefficients, DspError> {
    validate(frequency, q, sample_rate)?;

    let fs = Hertz::<f64>::from_hz(sample_rate).map_err(|_| invalid(frequency, q, sample_rate))?;
    let f0 = Hertz::<f64>::from_hz(frequency).map_err(|_| invalid(frequency, q, sample_rate))?;

    let coeffs: BiquadCoefficients = Coefficients::<f64>::from_params(filter, fs, f0, q)
        .map_err(|_| invalid(frequency, q, sample_rate))?
        .into();

    if !coeffs.is_stable() {
        return Err(invalid(frequency, q, sample_rate));
    }
    Ok(coeffs)
}

/// Two-pole peaking EQ (RBJ cookbook)
///
/// A gain of 0 dB produces an identity transfer function.
pub fn peaking_coefficients(
    frequency: f64,
    q: f64,
    gain_db: f64,
    sample_rate: f64,
) -> Result<BiquadCoefficients, DspError> {
    if !gain_db.is_finite() {
        return Err(invalid(frequency, q, sample_rate));
    }
    design(Type::PeakingEQ(gain_db), frequency, q, sample_rate)
}

/// Quality factor of section `index` in an even-order Butterworth cascade
///
/// Q_k = 1 / (2 cos((2k + 1) π / 2N))
fn butterworth_q(index: usize, order: u32) -> f64 {
    let angle = (2.0 * index as f64 + 1.0) * PI / (2.0 * order as f64);
    1.0 / (2.0 * angle.cos())
}

/// Number of biquad sections for a Butterworth order in {2, 4, 6, 8}
pub fn sections_for_order(order: u32) -> Result<usize, DspError> {
    match order {
        2 | 4 | 6 | 8 => Ok(order as usize / 2),
        _ => Err(DspError::InvalidOrder(order)),
    }
}

/// Butterworth cascade of `order / 2` high-pass or low-pass sections
pub fn butterworth(
    kind: CutKind,
    frequency: f64,
    sample_rate: f64,
    order: u32,
) -> Result<CutDesign, DspError> {
    let count = sections_for_order(order)?;
    let mut result = CutDesign::EMPTY;

    for index in 0..count {
        let q = butterworth_q(index, order);
        let filter = match kind {
            CutKind::HighPass => Type::HighPass,
            CutKind::LowPass => Type::LowPass,
        };
        result.sections[index] = design(filter, frequency, q, sample_rate)?;
    }
    result.len = count;

    Ok(result)
}

/// High-pass Butterworth cascade of the requested even order (2, 4, 6, 8)
pub fn butterworth_high_pass(
    frequency: f64,
    sample_rate: f64,
    order: u32,
) -> Result<CutDesign, DspError> {
    butterworth(CutKind::HighPass, frequency, sample_rate, order)
}

/// Low-pass Butterworth cascade of the requested even order (2, 4, 6, 8)
pub fn butterworth_low_pass(
    frequency: f64,
    sample_rate: f64,
    order: u32,
) -> Result<CutDesign, DspError> {
    butterworth(CutKind::LowPass, frequency, sample_rate, order)
}

/// Convert dB to linear amplitude
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to dB
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}
