use serde::{Deserialize, Serialize};

use crate::audio::features::AnalyzedTrack;
use crate::error::{MashupError, Result};

#[derive(Clone, Debug, Deserialize)]
pub struct MixSettings {
    /// Length of every segment except the last, in seconds
    #[serde(default = "default_segment")]
    pub segment_duration: f64,
    /// Crossfade overlap between neighbouring segments, in seconds
    #[serde(default = "default_transition")]
    pub transition_duration: f64,
    /// Fade used on the outer edge of the first and last segment
    #[serde(default = "default_edge_fade")]
    pub edge_fade: f64,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            segment_duration: default_segment(),
            transition_duration: default_transition(),
            edge_fade: default_edge_fade(),
        }
    }
}

fn default_segment() -> f64 { 30.0 }
fn default_transition() -> f64 { 8.0 }
fn default_edge_fade() -> f64 { 2.0 }

impl MixSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.transition_duration > 0.0) {
            return Err(MashupError::Input("transition_duration must be positive".into()));
        }
        if !(self.segment_duration > self.transition_duration) {
            return Err(MashupError::Input(
                "segment_duration must be longer than transition_duration".into(),
            ));
        }
        if !(self.edge_fade >= 0.0 && self.edge_fade <= self.transition_duration) {
            return Err(MashupError::Input(
                "edge_fade must lie between 0 and transition_duration".into(),
            ));
        }
        Ok(())
    }
}

/// One track's slot on the mix timeline. Times are absolute seconds.
#[derive(Clone, Debug, Serialize)]
pub struct TimelineSegment {
    /// Index into [`MixPlan::tracks`]
    pub track: usize,
    pub start: f64,
    pub duration: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

impl TimelineSegment {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Ordered tracks plus the crossfade timeline that mixes them.
#[derive(Clone, Debug)]
pub struct MixPlan {
    /// Tracks in mix order (ascending energy)
    pub tracks: Vec<AnalyzedTrack>,
    pub segments: Vec<TimelineSegment>,
    pub target_bpm: u32,
    pub transition_duration: f64,
    pub total_duration: f64,
}

/// Order tracks into a build-up (quietest first) and lay out overlapping
/// segments. Every non-final track gets a fixed-length segment; the final
/// one plays to its end, but never for less than one transition.
pub fn schedule(mut tracks: Vec<AnalyzedTrack>, settings: &MixSettings) -> Result<MixPlan> {
    if tracks.len() < 2 {
        return Err(MashupError::Input(format!(
            "at least 2 analyzed tracks are required, got {}",
            tracks.len()
        )));
    }
    settings.validate()?;

    // sort_by is stable, equal energies keep input order
    tracks.sort_by(|a, b| a.energy.total_cmp(&b.energy));

    log::info!("Mix order (by energy):");
    for (i, t) in tracks.iter().enumerate() {
        log::info!("  {}. {} - {} BPM, energy {:.4}", i + 1, t.id(), t.bpm, t.energy);
    }

    let bpm_sum: u64 = tracks.iter().map(|t| t.bpm as u64).sum();
    let target_bpm = (bpm_sum as f64 / tracks.len() as f64).round() as u32;
    log::info!("Target BPM: {}", target_bpm);

    let transition = settings.transition_duration;
    let last = tracks.len() - 1;
    let mut prev_end = 0.0;
    let mut segments = Vec::with_capacity(tracks.len());

    for (index, track) in tracks.iter().enumerate() {
        let is_last = index == last;
        let duration = if is_last {
            // a final track shorter than the crossfade still spans it
            let full = track.track.duration();
            if full < transition {
                log::warn!(
                    "'{}' is {:.2}s, shorter than the {:.2}s transition; padding with silence",
                    track.id(),
                    full,
                    transition
                );
            }
            full.max(transition)
        } else {
            settings.segment_duration
        };
        let start = if index > 0 { prev_end - transition } else { 0.0 };

        segments.push(TimelineSegment {
            track: index,
            start,
            duration,
            fade_in: if index == 0 { settings.edge_fade } else { transition },
            fade_out: if is_last { settings.edge_fade } else { transition },
        });

        prev_end = start + duration;
    }
    let total_duration = prev_end;

    for seg in &segments {
        log::info!(
            "  {}: {:.2}s - {:.2}s",
            tracks[seg.track].id(),
            seg.start,
            seg.end()
        );
    }
    log::info!("Total mashup duration: {:.2}s", total_duration);

    Ok(MixPlan {
        tracks,
        segments,
        target_bpm,
        transition_duration: transition,
        total_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::DecodedTrack;
    use crate::render::envelope::GainEnvelope;

    const SR: u32 = 100;

    fn analyzed(id: &str, secs: f64, bpm: u32, energy: f64) -> AnalyzedTrack {
        let frames = (secs * SR as f64) as usize;
        AnalyzedTrack {
            track: DecodedTrack::mono(id, SR, vec![0.0; frames]).unwrap(),
            bpm,
            peaks: Vec::new(),
            energy,
            spectral_centroid: 0.0,
        }
    }

    #[test]
    fn rejects_single_track() {
        let err = schedule(vec![analyzed("a", 40.0, 100, 0.1)], &MixSettings::default()).unwrap_err();
        assert!(matches!(err, MashupError::Input(_)));
    }

    #[test]
    fn two_track_build_up() {
        let tracks = vec![
            analyzed("loud", 35.0, 140, 0.05),
            analyzed("quiet", 40.0, 100, 0.01),
        ];
        let plan = schedule(tracks, &MixSettings::default()).unwrap();

        assert_eq!(plan.tracks[0].id(), "quiet");
        assert_eq!(plan.tracks[1].id(), "loud");
        assert_eq!(plan.target_bpm, 120);

        let first = &plan.segments[0];
        assert_eq!((first.start, first.duration), (0.0, 30.0));
        assert_eq!((first.fade_in, first.fade_out), (2.0, 8.0));

        let second = &plan.segments[1];
        assert_eq!((second.start, second.duration), (22.0, 35.0));
        assert_eq!((second.fade_in, second.fade_out), (8.0, 2.0));

        assert_eq!(plan.total_duration, 57.0);
        assert_eq!(second.end(), plan.total_duration);
    }

    #[test]
    fn five_track_timeline() {
        let tracks = vec![
            analyzed("e", 50.0, 120, 0.5),
            analyzed("b", 60.0, 120, 0.2),
            analyzed("d", 60.0, 120, 0.4),
            analyzed("a", 60.0, 120, 0.1),
            analyzed("c", 60.0, 120, 0.3),
        ];
        let plan = schedule(tracks, &MixSettings::default()).unwrap();

        let order: Vec<&str> = plan.tracks.iter().map(|t| t.id()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(plan.segments.len(), 5);

        let sum: f64 = plan.segments.iter().map(|s| s.duration).sum();
        assert_eq!(sum, 4.0 * 30.0 + 50.0);
        assert_eq!(plan.total_duration, sum - 4.0 * 8.0);

        for pair in plan.segments.windows(2) {
            assert_eq!(pair[0].start + pair[0].duration - 8.0, pair[1].start);
        }
        for seg in &plan.segments {
            assert!(seg.end() <= plan.total_duration);
        }

        assert_eq!(plan.segments[0].fade_in, 2.0);
        assert_eq!(plan.segments[4].fade_out, 2.0);
        for seg in &plan.segments[1..4] {
            assert_eq!((seg.fade_in, seg.fade_out), (8.0, 8.0));
        }
    }

    #[test]
    fn each_segment_starts_one_transition_before_previous_end() {
        let tracks = vec![
            analyzed("a", 40.0, 120, 0.1),
            analyzed("b", 40.0, 120, 0.2),
            analyzed("c", 45.5, 120, 0.3),
        ];
        let plan = schedule(tracks, &MixSettings::default()).unwrap();
        let starts: Vec<f64> = plan.segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0.0, 22.0, 44.0]);
        assert_eq!(plan.segments[2].end(), 89.5);
        assert_eq!(plan.total_duration, 89.5);
    }

    #[test]
    fn final_track_shorter_than_transition_spans_the_crossfade() {
        let tracks = vec![
            analyzed("long", 40.0, 120, 0.1),
            analyzed("blip", 5.0, 120, 0.2),
        ];
        let plan = schedule(tracks, &MixSettings::default()).unwrap();

        let last = &plan.segments[1];
        assert_eq!((last.start, last.duration), (22.0, 8.0));
        assert_eq!((last.fade_in, last.fade_out), (8.0, 2.0));
        assert_eq!(plan.total_duration, 30.0);
        for seg in &plan.segments {
            assert!(seg.end() <= plan.total_duration, "{:?}", seg);
        }

        // fade in and fade out overlap; the lower ramp wins
        let env = GainEnvelope::from_segment(last);
        assert!((env.gain_at(28.0) - 0.75).abs() < 1e-12);
        assert!((env.gain_at(29.5) - 0.25).abs() < 1e-12);
        assert_eq!(env.gain_at(30.0), 0.0);
    }

    #[test]
    fn equal_energy_keeps_input_order() {
        let tracks = vec![
            analyzed("first", 40.0, 100, 0.2),
            analyzed("second", 40.0, 100, 0.2),
            analyzed("quiet", 40.0, 100, 0.1),
        ];
        let plan = schedule(tracks, &MixSettings::default()).unwrap();
        let order: Vec<&str> = plan.tracks.iter().map(|t| t.id()).collect();
        assert_eq!(order, vec!["quiet", "first", "second"]);
    }

    #[test]
    fn target_bpm_rounds_mean() {
        let tracks = vec![
            analyzed("a", 40.0, 100, 0.1),
            analyzed("b", 40.0, 101, 0.2),
        ];
        let plan = schedule(tracks, &MixSettings::default()).unwrap();
        assert_eq!(plan.target_bpm, 101);
    }

    #[test]
    fn rejects_transition_longer_than_segment() {
        let settings = MixSettings {
            segment_duration: 5.0,
            ..MixSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
