//! Parameter Catalogue
//!
//! The fixed set of control values the chain reads every block, and the
//! narrow interface through which a host exposes them.

use std::collections::HashMap;
use std::sync::Arc;

use ruckus_dsp::{
    Band, BandSettings, CutSettings, ParameterSnapshot, Slope, FREQUENCY_RANGE, GAIN_RANGE,
    NUM_BANDS, Q_RANGE,
};

/// Total number of control values (3 per band + 2 per cut filter)
pub const NUM_PARAMETERS: usize = NUM_BANDS * 3 + 4;

/// Host-facing names, indexed by [`ParameterId::index`]
const NAMES: [&str; NUM_PARAMETERS] = [
    "HighPass Freq",
    "HighPass Slope",
    "Rumble Freq",
    "Rumble Gain",
    "Rumble Q",
    "Low Freq",
    "Low Gain",
    "Low Q",
    "LowMid Freq",
    "LowMid Gain",
    "LowMid Q",
    "HighMid Freq",
    "HighMid Gain",
    "HighMid Q",
    "High Freq",
    "High Gain",
    "High Q",
    "Air Freq",
    "Air Gain",
    "Air Q",
    "LowPass Freq",
    "LowPass Slope",
];

/// Numeric range and default of one parameter, as declared to the host
///
/// Limits come from the same constants [`ParameterSnapshot::clamped`] uses,
/// defaults from [`ParameterSnapshot::default`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

/// Identifier of one control value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    HighPassFreq,
    HighPassSlope,
    BandFreq(Band),
    BandGain(Band),
    BandQ(Band),
    LowPassFreq,
    LowPassSlope,
}

impl ParameterId {
    /// Every parameter, in catalogue order
    pub const ALL: [ParameterId; NUM_PARAMETERS] = [
        ParameterId::HighPassFreq,
        ParameterId::HighPassSlope,
        ParameterId::BandFreq(Band::Rumble),
        ParameterId::BandGain(Band::Rumble),
        ParameterId::BandQ(Band::Rumble),
        ParameterId::BandFreq(Band::Low),
        ParameterId::BandGain(Band::Low),
        ParameterId::BandQ(Band::Low),
        ParameterId::BandFreq(Band::LowMid),
        ParameterId::BandGain(Band::LowMid),
        ParameterId::BandQ(Band::LowMid),
        ParameterId::BandFreq(Band::HighMid),
        ParameterId::BandGain(Band::HighMid),
        ParameterId::BandQ(Band::HighMid),
        ParameterId::BandFreq(Band::High),
        ParameterId::BandGain(Band::High),
        ParameterId::BandQ(Band::High),
        ParameterId::BandFreq(Band::Air),
        ParameterId::BandGain(Band::Air),
        ParameterId::BandQ(Band::Air),
        ParameterId::LowPassFreq,
        ParameterId::LowPassSlope,
    ];

    pub fn index(self) -> usize {
        match self {
            ParameterId::HighPassFreq => 0,
            ParameterId::HighPassSlope => 1,
            ParameterId::BandFreq(band) => 2 + band.index() * 3,
            ParameterId::BandGain(band) => 3 + band.index() * 3,
            ParameterId::BandQ(band) => 4 + band.index() * 3,
            ParameterId::LowPassFreq => NUM_PARAMETERS - 2,
            ParameterId::LowPassSlope => NUM_PARAMETERS - 1,
        }
    }

    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .position(|n| *n == name)
            .map(|index| Self::ALL[index])
    }

    pub fn range(self) -> ParameterRange {
        let (min, max) = match self {
            ParameterId::HighPassFreq | ParameterId::LowPassFreq | ParameterId::BandFreq(_) => {
                FREQUENCY_RANGE
            }
            ParameterId::HighPassSlope | ParameterId::LowPassSlope => {
                (0.0, (Slope::ALL.len() - 1) as f64)
            }
            ParameterId::BandGain(_) => GAIN_RANGE,
            ParameterId::BandQ(_) => Q_RANGE,
        };
        ParameterRange {
            min,
            max,
            default: self.default_value(),
        }
    }

    /// Value in the default snapshot
    pub fn default_value(self) -> f64 {
        self.value_in(&ParameterSnapshot::default())
    }

    /// The value this parameter has inside `snapshot`
    pub fn value_in(self, snapshot: &ParameterSnapshot) -> f64 {
        match self {
            ParameterId::HighPassFreq => snapshot.high_pass.frequency,
            ParameterId::HighPassSlope => snapshot.high_pass.slope.index() as f64,
            ParameterId::BandFreq(band) => snapshot.band(band).frequency,
            ParameterId::BandGain(band) => snapshot.band(band).gain_db,
            ParameterId::BandQ(band) => snapshot.band(band).q,
            ParameterId::LowPassFreq => snapshot.low_pass.frequency,
            ParameterId::LowPassSlope => snapshot.low_pass.slope.index() as f64,
        }
    }
}

/// Read access to the host's current control values
///
/// Implementations are called from the audio thread once per block and must
/// not block or allocate.
pub trait ParameterSource {
    /// Current value of the parameter called `name`, `None` if unknown
    fn parameter_value(&self, name: &str) -> Option<f64>;

    /// All values sampled at one instant
    ///
    /// `None` when no consistent read was possible within a bounded time; the
    /// caller keeps its previous snapshot. Sources whose values can change
    /// mid-read override this.
    fn read_snapshot(&self) -> Option<ParameterSnapshot> {
        Some(build_snapshot(self))
    }

    /// Called by the coordinator's `prepare()` with the stream sample rate
    fn on_prepare(&self, _sample_rate: f64) {}
}

impl<T: ParameterSource + ?Sized> ParameterSource for &T {
    fn parameter_value(&self, name: &str) -> Option<f64> {
        (**self).parameter_value(name)
    }

    fn read_snapshot(&self) -> Option<ParameterSnapshot> {
        (**self).read_snapshot()
    }

    fn on_prepare(&self, sample_rate: f64) {
        (**self).on_prepare(sample_rate)
    }
}

impl<T: ParameterSource + ?Sized> ParameterSource for Arc<T> {
    fn parameter_value(&self, name: &str) -> Option<f64> {
        (**self).parameter_value(name)
    }

    fn read_snapshot(&self) -> Option<ParameterSnapshot> {
        (**self).read_snapshot()
    }

    fn on_prepare(&self, sample_rate: f64) {
        (**self).on_prepare(sample_rate)
    }
}

impl ParameterSource for HashMap<String, f64> {
    fn parameter_value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl ParameterSource for ParameterSnapshot {
    fn parameter_value(&self, name: &str) -> Option<f64> {
        ParameterId::from_name(name).map(|id| id.value_in(self))
    }

    fn read_snapshot(&self) -> Option<ParameterSnapshot> {
        Some(*self)
    }
}

/// Sample every control value from `source` into a new snapshot
///
/// Unknown or NaN values fall back to the parameter's default. Range
/// clamping against the live sample rate is left to the coordinator.
pub fn build_snapshot<S: ParameterSource + ?Sized>(source: &S) -> ParameterSnapshot {
    snapshot_from(|id| source.parameter_value(id.name()))
}

/// Assemble a snapshot from a per-parameter lookup
///
/// Same fallback rules as [`build_snapshot`]; lets sources that store values
/// by [`ParameterId::index`] skip the name lookup.
pub fn snapshot_from<F>(lookup: F) -> ParameterSnapshot
where
    F: Fn(ParameterId) -> Option<f64>,
{
    let value = |id: ParameterId| {
        lookup(id)
            .filter(|v| !v.is_nan())
            .unwrap_or_else(|| id.default_value())
    };

    let band = |band: Band| {
        BandSettings::new(
            value(ParameterId::BandFreq(band)),
            value(ParameterId::BandGain(band)),
            value(ParameterId::BandQ(band)),
        )
    };

    ParameterSnapshot {
        high_pass: CutSettings::new(
            value(ParameterId::HighPassFreq),
            Slope::from_index(value(ParameterId::HighPassSlope)),
        ),
        bands: Band::ALL.map(band),
        low_pass: CutSettings::new(
            value(ParameterId::LowPassFreq),
            Slope::from_index(value(ParameterId::LowPassSlope)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_consistent() {
        assert_eq!(NUM_PARAMETERS, 22);
        for (i, id) in ParameterId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ParameterId::from_name(id.name()), Some(*id));
        }
    }

    #[test]
    fn test_names_follow_host_convention() {
        assert_eq!(ParameterId::HighPassFreq.name(), "HighPass Freq");
        assert_eq!(ParameterId::BandGain(Band::Low).name(), "Low Gain");
        assert_eq!(ParameterId::BandQ(Band::HighMid).name(), "HighMid Q");
        assert_eq!(ParameterId::LowPassSlope.name(), "LowPass Slope");
        assert_eq!(ParameterId::from_name("Bass Gain"), None);
    }

    #[test]
    fn test_defaults_match_default_snapshot() {
        let snapshot = ParameterSnapshot::default();
        for id in ParameterId::ALL {
            assert_eq!(id.range().default, id.value_in(&snapshot), "{}", id.name());
        }
    }

    #[test]
    fn test_ranges_match_snapshot_clamping() {
        let gain = ParameterId::BandGain(Band::Air).range();
        assert_eq!((gain.min, gain.max), GAIN_RANGE);
        assert_eq!(ParameterId::BandQ(Band::Air).range().min, Q_RANGE.0);
        assert_eq!(ParameterId::LowPassSlope.range().max, 3.0);

        // Out-of-range values land on the declared limits
        let wild = ParameterSnapshot::default()
            .with_band(Band::Air, BandSettings::new(30000.0, 100.0, 0.0))
            .with_high_pass(CutSettings::new(1.0, Slope::Db12));
        let clamped = wild.clamped(192000.0);
        let air = clamped.band(Band::Air);
        assert_eq!(air.frequency, ParameterId::BandFreq(Band::Air).range().max);
        assert_eq!(air.gain_db, gain.max);
        assert_eq!(air.q, ParameterId::BandQ(Band::Air).range().min);
        assert_eq!(clamped.high_pass.frequency, ParameterId::HighPassFreq.range().min);
    }

    #[test]
    fn test_snapshot_from_lookup() {
        let snapshot = snapshot_from(|id| match id {
            ParameterId::BandGain(Band::High) => Some(-3.0),
            ParameterId::LowPassSlope => Some(f64::NAN),
            _ => None,
        });
        assert_eq!(snapshot.band(Band::High).gain_db, -3.0);
        assert_eq!(snapshot.low_pass.slope, Slope::Db12);
        assert_eq!(snapshot.band(Band::High).frequency, 4000.0);
    }

    #[test]
    fn test_build_snapshot_from_map() {
        let mut values = HashMap::new();
        values.insert("Low Freq".to_string(), 250.0);
        values.insert("Low Gain".to_string(), 6.0);
        values.insert("HighPass Slope".to_string(), 2.0);
        values.insert("Air Q".to_string(), f64::NAN);

        let snapshot = build_snapshot(&values);
        assert_eq!(snapshot.band(Band::Low).frequency, 250.0);
        assert_eq!(snapshot.band(Band::Low).gain_db, 6.0);
        assert_eq!(snapshot.high_pass.slope, Slope::Db36);

        // Missing and NaN values use defaults
        assert_eq!(snapshot.band(Band::Air).q, 1.0);
        assert_eq!(snapshot.low_pass.frequency, 20000.0);
    }

    #[test]
    fn test_snapshot_as_source_roundtrips() {
        let snapshot = ParameterSnapshot::default()
            .with_band(Band::Rumble, BandSettings::new(45.0, -3.0, 0.7))
            .with_low_pass(CutSettings::new(12000.0, Slope::Db48));
        assert_eq!(build_snapshot(&snapshot), snapshot);
    }
}
