//! Parameter Snapshot
//!
//! Immutable copy of every control value the filter chain depends on. A new
//! snapshot is taken at the start of each block and replaces the previous
//! one wholesale.

use serde::{Deserialize, Serialize};

use crate::error::DspError;

/// Number of parametric bands in the chain
pub const NUM_BANDS: usize = 6;

/// Valid frequency range for every filter (Hz)
pub const FREQUENCY_RANGE: (f64, f64) = (20.0, 22000.0);

/// Valid peaking gain range (dB)
pub const GAIN_RANGE: (f64, f64) = (-24.0, 24.0);

/// Valid peaking quality factor range
pub const Q_RANGE: (f64, f64) = (0.1, 10.0);

/// Fraction of Nyquist a design frequency is clamped to
pub const NYQUIST_MARGIN: f64 = 0.99;

/// Parametric bands in fixed frequency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Rumble,
    Low,
    LowMid,
    HighMid,
    High,
    Air,
}

impl Band {
    pub const ALL: [Band; NUM_BANDS] = [
        Band::Rumble,
        Band::Low,
        Band::LowMid,
        Band::HighMid,
        Band::High,
        Band::Air,
    ];

    /// Position of the band inside the chain's band array
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Rumble => "Rumble",
            Band::Low => "Low",
            Band::LowMid => "LowMid",
            Band::HighMid => "HighMid",
            Band::High => "High",
            Band::Air => "Air",
        }
    }

    /// Default center frequency (Hz)
    pub fn default_frequency(self) -> f64 {
        match self {
            Band::Rumble => 60.0,
            Band::Low => 200.0,
            Band::LowMid => 500.0,
            Band::HighMid => 1500.0,
            Band::High => 4000.0,
            Band::Air => 12000.0,
        }
    }
}

/// Cut filter steepness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Parse a slope given in dB/octave
    pub fn from_db_per_octave(db: u32) -> Result<Self, DspError> {
        match db {
            12 => Ok(Slope::Db12),
            24 => Ok(Slope::Db24),
            36 => Ok(Slope::Db36),
            48 => Ok(Slope::Db48),
            other => Err(DspError::InvalidOrder(other)),
        }
    }

    /// Map a host choice index (0 = 12 dB/oct ... 3 = 48 dB/oct)
    ///
    /// The value is rounded and clamped, so any finite input yields a slope.
    pub fn from_index(index: f64) -> Self {
        if !index.is_finite() {
            return Slope::Db12;
        }
        match index.round().clamp(0.0, 3.0) as u8 {
            0 => Slope::Db12,
            1 => Slope::Db24,
            2 => Slope::Db36,
            _ => Slope::Db48,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn db_per_octave(self) -> u32 {
        12 * (self as u32 + 1)
    }

    /// Butterworth order realizing this slope
    pub fn order(self) -> u32 {
        2 * (self as u32 + 1)
    }

    /// Number of biquad sections enabled for this slope
    pub fn active_sections(self) -> usize {
        self as usize + 1
    }
}

/// One parametric band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSettings {
    pub frequency: f64,
    pub gain_db: f64,
    pub q: f64,
}

impl BandSettings {
    pub fn new(frequency: f64, gain_db: f64, q: f64) -> Self {
        Self {
            frequency,
            gain_db,
            q,
        }
    }
}

/// One cut filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutSettings {
    pub frequency: f64,
    pub slope: Slope,
}

impl CutSettings {
    pub fn new(frequency: f64, slope: Slope) -> Self {
        Self { frequency, slope }
    }
}

/// Everything the chain needs to know to design its coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub high_pass: CutSettings,
    pub bands: [BandSettings; NUM_BANDS],
    pub low_pass: CutSettings,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            high_pass: CutSettings::new(FREQUENCY_RANGE.0, Slope::Db12),
            bands: Band::ALL.map(|band| BandSettings::new(band.default_frequency(), 0.0, 1.0)),
            low_pass: CutSettings::new(20000.0, Slope::Db12),
        }
    }
}

/// Clamp into `range`, falling back to `fallback` for NaN
fn clamp_or(value: f64, range: (f64, f64), fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(range.0, range.1)
    }
}

impl ParameterSnapshot {
    pub fn band(&self, band: Band) -> &BandSettings {
        &self.bands[band.index()]
    }

    /// Copy of this snapshot with one band replaced
    pub fn with_band(mut self, band: Band, settings: BandSettings) -> Self {
        self.bands[band.index()] = settings;
        self
    }

    pub fn with_high_pass(mut self, settings: CutSettings) -> Self {
        self.high_pass = settings;
        self
    }

    pub fn with_low_pass(mut self, settings: CutSettings) -> Self {
        self.low_pass = settings;
        self
    }

    /// Copy of this snapshot with every band gain replaced
    pub fn with_band_gains(mut self, gains: [f64; NUM_BANDS]) -> Self {
        for (band, gain_db) in self.bands.iter_mut().zip(gains) {
            band.gain_db = gain_db;
        }
        self
    }

    /// Clamp every value into its valid range and below the Nyquist limit of
    /// `sample_rate`
    ///
    /// NaN values are replaced by the default for that parameter.
    pub fn clamped(&self, sample_rate: f64) -> Self {
        let defaults = Self::default();
        let max_frequency = (sample_rate * 0.5 * NYQUIST_MARGIN).min(FREQUENCY_RANGE.1);
        let freq_range = (FREQUENCY_RANGE.0.min(max_frequency), max_frequency);

        let clamp_cut = |cut: &CutSettings, fallback: &CutSettings| {
            CutSettings::new(clamp_or(cut.frequency, freq_range, fallback.frequency), cut.slope)
        };

        let mut bands = self.bands;
        for (band, fallback) in bands.iter_mut().zip(defaults.bands.iter()) {
            band.frequency = clamp_or(band.frequency, freq_range, fallback.frequency);
            band.gain_db = clamp_or(band.gain_db, GAIN_RANGE, fallback.gain_db);
            band.q = clamp_or(band.q, Q_RANGE, fallback.q);
        }

        Self {
            high_pass: clamp_cut(&self.high_pass, &defaults.high_pass),
            bands,
            low_pass: clamp_cut(&self.low_pass, &defaults.low_pass),
        }
    }
}
