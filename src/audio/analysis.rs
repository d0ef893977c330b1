use rayon::prelude::*;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;

use super::decode::DecodedTrack;
use super::features::AnalyzedTrack;
use super::filter::low_pass;
use super::peaks::{detect_peaks, MIN_PEAK_DISTANCE_SECS, PEAK_THRESHOLD};
use super::tempo::estimate_bpm;
use crate::error::{check_cancelled, MashupError, Result};

/// Number of leading samples the brightness proxy looks at.
const CENTROID_WINDOW: usize = 2048;

#[derive(Clone, Debug, Deserialize)]
pub struct AnalysisSettings {
    /// Cutoff of the beat-isolating low-pass, in Hz
    #[serde(default = "default_cutoff")]
    pub low_pass_cutoff: f64,
    #[serde(default = "default_threshold")]
    pub peak_threshold: f32,
    /// Minimum spacing between beats, in seconds
    #[serde(default = "default_min_distance")]
    pub min_peak_distance: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            low_pass_cutoff: default_cutoff(),
            peak_threshold: default_threshold(),
            min_peak_distance: default_min_distance(),
        }
    }
}

fn default_cutoff() -> f64 { 150.0 }
fn default_threshold() -> f32 { PEAK_THRESHOLD }
fn default_min_distance() -> f64 { MIN_PEAK_DISTANCE_SECS }

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.low_pass_cutoff > 0.0) {
            return Err(MashupError::Input("low_pass_cutoff must be positive".into()));
        }
        if !(self.min_peak_distance > 0.0) {
            return Err(MashupError::Input("min_peak_distance must be positive".into()));
        }
        if !(self.peak_threshold >= 0.0) {
            return Err(MashupError::Input("peak_threshold must not be negative".into()));
        }
        Ok(())
    }
}

/// Analyze every track in parallel, preserving input order. The first
/// failure (or a raised cancel flag) aborts the whole batch.
pub fn analyze_tracks(
    tracks: Vec<DecodedTrack>,
    settings: &AnalysisSettings,
    cancel_flag: &AtomicBool,
) -> Result<Vec<AnalyzedTrack>> {
    settings.validate()?;
    check_cancelled(cancel_flag)?;

    tracks
        .into_par_iter()
        .map(|track| {
            check_cancelled(cancel_flag)?;
            Ok(analyze_track(track, settings))
        })
        .collect()
}

/// Beat, tempo, energy and brightness descriptors for one track. Tracks too
/// short for peak detection simply come out at the fallback tempo.
pub fn analyze_track(track: DecodedTrack, settings: &AnalysisSettings) -> AnalyzedTrack {
    let samples = track.primary();
    let sr = track.sample_rate;

    let filtered = low_pass(samples, sr, settings.low_pass_cutoff);
    let peaks = detect_peaks(&filtered, sr, settings.peak_threshold, settings.min_peak_distance);
    let bpm = estimate_bpm(&peaks, sr);
    let energy = energy(samples);
    let spectral_centroid = spectral_centroid(samples);

    log::info!(
        "Analyzed '{}': {} BPM ({} beats), energy={:.4}, centroid={:.1}",
        track.id, bpm, peaks.len(), energy, spectral_centroid
    );

    AnalyzedTrack {
        track,
        bpm,
        peaks,
        energy,
        spectral_centroid,
    }
}

/// Mean squared amplitude.
pub fn energy(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    total / samples.len() as f64
}

/// Amplitude-weighted mean sample index over the opening window. A crude
/// brightness stand-in; no transform is involved.
pub fn spectral_centroid(samples: &[f32]) -> f64 {
    let window = &samples[..samples.len().min(CENTROID_WINDOW)];

    let mut weighted_sum = 0.0f64;
    let mut magnitude_sum = 0.0f64;
    for (i, &s) in window.iter().enumerate() {
        let magnitude = s.abs() as f64;
        weighted_sum += i as f64 * magnitude;
        magnitude_sum += magnitude;
    }

    if magnitude_sum > 0.0 {
        weighted_sum / magnitude_sum
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn energy_is_mean_square() {
        assert_eq!(energy(&[]), 0.0);
        assert!((energy(&[0.5, -0.5, 1.0, 0.0]) - 0.375).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_silence_is_zero() {
        assert_eq!(spectral_centroid(&[0.0; 4096]), 0.0);
    }

    #[test]
    fn centroid_is_weighted_index() {
        // magnitudes 1 at index 1 and 3 at index 3 -> (1 + 9) / 4
        let samples = [0.0, 1.0, 0.0, -3.0];
        assert!((spectral_centroid(&samples) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn centroid_ignores_samples_past_window() {
        let mut samples = vec![0.0f32; 5000];
        samples[10] = 1.0;
        samples[4000] = 1.0;
        assert!((spectral_centroid(&samples) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn short_track_falls_back_to_120() {
        let track = DecodedTrack::mono("blip", 44100, vec![1.0; 1000]).unwrap();
        let analyzed = analyze_track(track, &AnalysisSettings::default());
        assert!(analyzed.peaks.is_empty());
        assert_eq!(analyzed.bpm, 120);
    }

    #[test]
    fn cancelled_batch_is_rejected() {
        let flag = AtomicBool::new(false);
        flag.store(true, Ordering::Relaxed);
        let track = DecodedTrack::mono("t", 8000, vec![0.0; 8000]).unwrap();
        let err = analyze_tracks(vec![track], &AnalysisSettings::default(), &flag).unwrap_err();
        assert!(matches!(err, MashupError::Cancelled));
    }

    #[test]
    fn rejects_non_positive_cutoff() {
        let settings = AnalysisSettings {
            low_pass_cutoff: 0.0,
            ..AnalysisSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
