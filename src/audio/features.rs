use serde::Serialize;

use super::decode::DecodedTrack;

/// A decoded track plus the descriptors the scheduler needs. Built once by
/// the analyzer and never changed afterwards.
#[derive(Clone, Debug)]
pub struct AnalyzedTrack {
    pub track: DecodedTrack,
    /// Tempo estimate, 60-180 after octave correction
    pub bpm: u32,
    /// Detected beat positions (sample indices, strictly increasing)
    pub peaks: Vec<usize>,
    /// Mean squared amplitude of the first channel
    pub energy: f64,
    /// Amplitude-weighted mean sample index over the first 2048 samples
    pub spectral_centroid: f64,
}

impl AnalyzedTrack {
    pub fn id(&self) -> &str {
        &self.track.id
    }

    pub fn summary(&self) -> TrackSummary {
        TrackSummary {
            id: self.track.id.clone(),
            bpm: self.bpm,
            energy: self.energy,
            spectral_centroid: self.spectral_centroid,
            beats: self.peaks.len(),
            duration: self.track.duration(),
        }
    }
}

/// Display-only metadata for one analyzed track.
#[derive(Clone, Debug, Serialize)]
pub struct TrackSummary {
    pub id: String,
    pub bpm: u32,
    pub energy: f64,
    pub spectral_centroid: f64,
    pub beats: usize,
    pub duration: f64,
}
