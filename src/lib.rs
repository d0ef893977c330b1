//! # mashup
//!
//! Automated DJ-style mashups: decode several tracks, estimate tempo and
//! energy, order them into a build-up with crossfades, and render the mix
//! offline through EQ and dynamics into a 16-bit WAVE file.

pub mod audio;
pub mod config;
pub mod encode;
pub mod error;
pub mod mashup;
pub mod mix;
pub mod render;

pub use crate::{
    audio::{
        analysis::{analyze_track, AnalysisSettings},
        decode::{fetch_decoded_audio, load_track, DecodedTrack},
        features::AnalyzedTrack,
    },
    encode::wav::encode_wav,
    error::{MashupError, Result},
    mashup::{create_mashup, load_tracks, MashupReport, MashupResult, MashupSettings},
    mix::schedule::{schedule, MixPlan, MixSettings, TimelineSegment},
    render::{buffer::StereoBuffer, offline::render_mix, offline::RenderSettings},
};
