//! Response Sampler
//!
//! Evaluates the chain's magnitude response for display. Works purely from a
//! snapshot and the coefficient math, never from live filter state, so it can
//! run on a UI thread while the audio thread processes.

use crate::chain::ChainCoefficients;
use crate::coefficients::gain_to_db;
use crate::snapshot::ParameterSnapshot;

/// Lowest frequency on the usual display axis (Hz)
pub const DISPLAY_MIN_HZ: f64 = 20.0;

/// Highest frequency on the usual display axis (Hz)
pub const DISPLAY_MAX_HZ: f64 = 22000.0;

/// `n` log-spaced frequencies from `min` to `max` inclusive
pub fn log_spaced_frequencies(n: usize, min: f64, max: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let log_min = min.log10();
            let log_max = max.log10();
            (0..n)
                .map(|i| {
                    let t = i as f64 / (n - 1) as f64;
                    10.0_f64.powf(log_min + t * (log_max - log_min))
                })
                .collect()
        }
    }
}

/// Magnitude response in dB at each of `frequencies`
///
/// The snapshot is clamped against `sample_rate` first, exactly like the
/// audio path does, so the curve matches what is heard.
pub fn sample_response(
    snapshot: &ParameterSnapshot,
    sample_rate: f64,
    frequencies: &[f64],
) -> Vec<f64> {
    let mut magnitudes = vec![0.0; frequencies.len()];
    sample_response_into(snapshot, sample_rate, frequencies, &mut magnitudes);
    magnitudes
}

/// Same as [`sample_response`], writing into a caller-owned buffer
///
/// Only `min(frequencies.len(), out.len())` entries are written.
pub fn sample_response_into(
    snapshot: &ParameterSnapshot,
    sample_rate: f64,
    frequencies: &[f64],
    out: &mut [f64],
) {
    let coefficients = ChainCoefficients::design(&snapshot.clamped(sample_rate), sample_rate);
    for (db, freq) in out.iter_mut().zip(frequencies) {
        *db = gain_to_db(coefficients.magnitude_at(*freq));
    }
}
