//! One mashup request end to end: decode -> analyze -> schedule -> render
//! -> encode. Each request owns all of its buffers; nothing is shared
//! between requests except the cancel flag the caller hands in.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;

use crate::audio::analysis::{analyze_tracks, AnalysisSettings};
use crate::audio::decode::{load_track, DecodedTrack};
use crate::audio::features::{AnalyzedTrack, TrackSummary};
use crate::encode::wav::encode_stereo;
use crate::error::{check_cancelled, MashupError, Result};
use crate::mix::schedule::{schedule, MixPlan, MixSettings};
use crate::render::buffer::StereoBuffer;
use crate::render::offline::{render_mix, RenderSettings};

pub const MIN_TRACKS: usize = 2;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MashupSettings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub mix: MixSettings,
    #[serde(default)]
    pub render: RenderSettings,
}

impl MashupSettings {
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.mix.validate()?;
        if !(self.render.makeup_gain >= 0.0) {
            return Err(MashupError::Input("makeup_gain must not be negative".into()));
        }
        Ok(())
    }
}

pub struct MashupResult {
    pub rendered: StereoBuffer,
    /// Encoded 16-bit PCM WAVE file
    pub wav: Vec<u8>,
    pub plan: MixPlan,
}

impl MashupResult {
    /// Analyzed tracks in the order they were mixed.
    pub fn tracks(&self) -> &[AnalyzedTrack] {
        &self.plan.tracks
    }

    pub fn report(&self) -> MashupReport {
        let tracks = self
            .plan
            .segments
            .iter()
            .enumerate()
            .map(|(order, seg)| ReportEntry {
                order: order + 1,
                track: self.plan.tracks[seg.track].summary(),
                start: seg.start,
                duration: seg.duration,
                fade_in: seg.fade_in,
                fade_out: seg.fade_out,
            })
            .collect();

        MashupReport {
            target_bpm: self.plan.target_bpm,
            total_duration: self.plan.total_duration,
            sample_rate: self.rendered.sample_rate,
            tracks,
        }
    }
}

/// Display metadata for a finished mashup. Not written into the audio.
#[derive(Clone, Debug, Serialize)]
pub struct MashupReport {
    pub target_bpm: u32,
    pub total_duration: f64,
    pub sample_rate: u32,
    pub tracks: Vec<ReportEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportEntry {
    pub order: usize,
    #[serde(flatten)]
    pub track: TrackSummary,
    pub start: f64,
    pub duration: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

/// Fetch/decode every source concurrently. Order follows `sources`; the
/// first failure aborts the batch.
pub fn load_tracks(sources: &[String], cancel_flag: &AtomicBool) -> Result<Vec<DecodedTrack>> {
    ensure_enough(sources.len())?;
    check_cancelled(cancel_flag)?;

    sources
        .par_iter()
        .map(|source| {
            check_cancelled(cancel_flag)?;
            load_track(source)
        })
        .collect()
}

/// Analyze, schedule, render and encode already-decoded tracks.
pub fn create_mashup(
    tracks: Vec<DecodedTrack>,
    settings: &MashupSettings,
    cancel_flag: &AtomicBool,
    on_track: &(dyn Fn(&str) + Sync),
) -> Result<MashupResult> {
    ensure_enough(tracks.len())?;
    settings.validate()?;

    log::info!("Analyzing {} tracks...", tracks.len());
    let analyzed = analyze_tracks(tracks, &settings.analysis, cancel_flag)?;

    let plan = schedule(analyzed, &settings.mix)?;
    check_cancelled(cancel_flag)?;

    let rendered = render_mix(&plan, &settings.render, cancel_flag, on_track)?;
    check_cancelled(cancel_flag)?;

    let wav = encode_stereo(&rendered)?;
    log::info!(
        "Mashup complete: {:.2}s, {:.2} MB",
        rendered.duration(),
        wav.len() as f64 / 1024.0 / 1024.0
    );

    Ok(MashupResult { rendered, wav, plan })
}

fn ensure_enough(count: usize) -> Result<()> {
    if count < MIN_TRACKS {
        return Err(MashupError::Input(format!(
            "select at least {} tracks, got {}",
            MIN_TRACKS, count
        )));
    }
    Ok(())
}
