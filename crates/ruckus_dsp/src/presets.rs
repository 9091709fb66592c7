//! Built-in Band Presets

use crate::snapshot::{ParameterSnapshot, NUM_BANDS};

/// Named preset with 6 band gains (Rumble, Low, LowMid, HighMid, High, Air)
pub type Preset = (&'static str, [f64; NUM_BANDS]);

/// List of built-in presets
pub const PRESETS: &[Preset] = &[
    ("Flat", [0.0; NUM_BANDS]),
    ("Warmth", [0.0, 3.0, 1.5, 0.0, -1.0, -2.0]),
    ("Presence", [0.0, 0.0, -1.0, 2.0, 4.0, 2.0]),
    ("Air Lift", [0.0, 0.0, 0.0, 0.0, 1.5, 5.0]),
    ("Mud Cut", [0.0, -1.0, -4.0, 0.0, 0.0, 0.0]),
    ("Rumble Cut", [-12.0, -2.0, 0.0, 0.0, 0.0, 0.0]),
    ("Smile", [3.0, 2.0, -2.0, -1.0, 2.0, 4.0]),
];

/// Look up a preset by name (case-insensitive)
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|(n, _)| n.eq_ignore_ascii_case(name))
}

/// Apply a preset's gains on top of `base`, keeping frequencies, Q and cut
/// filters untouched
pub fn apply_preset(base: &ParameterSnapshot, preset: &Preset) -> ParameterSnapshot {
    base.with_band_gains(preset.1)
}
