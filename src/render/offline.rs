use rayon::prelude::*;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;

use super::buffer::StereoBuffer;
use super::pipeline::Chain;
use crate::error::{check_cancelled, MashupError, Result};
use crate::mix::schedule::MixPlan;

#[derive(Clone, Debug, Deserialize)]
pub struct RenderSettings {
    /// Linear gain applied after the master limiter
    #[serde(default = "default_makeup_gain")]
    pub makeup_gain: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            makeup_gain: default_makeup_gain(),
        }
    }
}

fn default_makeup_gain() -> f32 { 1.8 }

/// Render the whole timeline into one stereo buffer.
///
/// Every segment runs through its own chain (in parallel) and lands on the
/// master bus at its absolute start frame; the bus then goes through the
/// master chain. All tracks play at the first track's sample rate.
/// `on_track` is called once per finished track chain.
pub fn render_mix(
    plan: &MixPlan,
    settings: &RenderSettings,
    cancel_flag: &AtomicBool,
    on_track: &(dyn Fn(&str) + Sync),
) -> Result<StereoBuffer> {
    if plan.segments.len() < 2 || plan.tracks.len() != plan.segments.len() {
        return Err(MashupError::Input(
            "render requires an analyzed and scheduled set of at least 2 tracks".into(),
        ));
    }
    check_cancelled(cancel_flag)?;

    let sample_rate = plan.tracks[0].track.sample_rate;
    for t in &plan.tracks[1..] {
        if t.track.sample_rate != sample_rate {
            log::warn!(
                "'{}' is {}Hz but the mix renders at {}Hz; it will play off-speed",
                t.id(),
                t.track.sample_rate,
                sample_rate
            );
        }
    }

    let sr = sample_rate as f64;
    let total_frames = (plan.total_duration * sr).floor() as usize;
    log::info!(
        "Rendering {} tracks: {} frames @ {}Hz ({:.2}s)",
        plan.segments.len(),
        total_frames,
        sample_rate,
        plan.total_duration
    );

    let rendered: Vec<(usize, StereoBuffer)> = plan
        .segments
        .par_iter()
        .map(|seg| {
            check_cancelled(cancel_flag)?;

            let track = &plan.tracks[seg.track];
            let start_frame = (seg.start * sr).round() as usize;
            let end_frame = ((seg.end() * sr).round() as usize).min(total_frames);
            let frames = end_frame.saturating_sub(start_frame);

            log::debug!("Track chain for '{}' at frame {}", track.id(), start_frame);
            let source = StereoBuffer::from_track(&track.track, frames);
            let out = Chain::track(seg, start_frame, sample_rate).run(source);

            if out.frames() != frames {
                return Err(MashupError::Render(format!(
                    "track chain for '{}' produced {} frames, expected {}",
                    track.id(),
                    out.frames(),
                    frames
                )));
            }

            on_track(track.id());
            Ok((start_frame, out))
        })
        .collect::<Result<_>>()?;

    check_cancelled(cancel_flag)?;

    let mut bus = StereoBuffer::silent(total_frames, sample_rate);
    for (start_frame, part) in &rendered {
        if !bus.mix_in(part, *start_frame) {
            return Err(MashupError::Render(format!(
                "segment at frame {} ({} frames) overruns the {}-frame mix",
                start_frame,
                part.frames(),
                total_frames
            )));
        }
    }

    let master = Chain::master(sample_rate, settings.makeup_gain);
    log::info!(
        "Master chain: {} (makeup x{:.2})",
        master.stage_names().join(" -> "),
        settings.makeup_gain
    );
    let mixed = master.run(bus);

    if mixed.frames() != total_frames {
        return Err(MashupError::Render(format!(
            "master chain produced {} frames, expected {}",
            mixed.frames(),
            total_frames
        )));
    }
    if !mixed.is_finite() {
        return Err(MashupError::Render("non-finite sample in rendered output".into()));
    }

    Ok(mixed)
}
