//! Processing chains: ordered lists of buffer-to-buffer stages.
//!
//! Each stage takes ownership of its input and hands back the output, so a
//! chain is a straight ownership hand-off with no shared node graph.

use super::buffer::StereoBuffer;
use super::dynamics::{Compressor, CompressorParams, MASTER_COMPRESSOR, MASTER_LIMITER, TRACK_COMPRESSOR};
use super::envelope::GainEnvelope;
use super::eq::{ShelfFilter, ShelfKind};
use crate::mix::schedule::TimelineSegment;

pub trait Stage: Send {
    fn name(&self) -> &'static str;
    fn process(&mut self, input: StereoBuffer) -> StereoBuffer;
}

pub struct Chain {
    stages: Vec<Box<dyn Stage>>,
}

impl Chain {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// gain envelope -> low shelf -> high shelf -> track compressor
    pub fn track(segment: &TimelineSegment, start_frame: usize, sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        Self::new(vec![
            Box::new(EnvelopeStage {
                envelope: GainEnvelope::from_segment(segment),
                start_frame,
                sample_rate: sr,
            }),
            Box::new(ShelfStage::new(ShelfKind::Low, 200.0, 3.0, sr)),
            Box::new(ShelfStage::new(ShelfKind::High, 3000.0, 2.0, sr)),
            Box::new(CompressorStage::new("track compressor", TRACK_COMPRESSOR, sr)),
        ])
    }

    /// master compressor -> limiter -> fixed makeup gain
    pub fn master(sample_rate: u32, makeup_gain: f32) -> Self {
        let sr = sample_rate as f64;
        Self::new(vec![
            Box::new(CompressorStage::new("master compressor", MASTER_COMPRESSOR, sr)),
            Box::new(CompressorStage::new("limiter", MASTER_LIMITER, sr)),
            Box::new(GainStage { gain: makeup_gain }),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(mut self, input: StereoBuffer) -> StereoBuffer {
        let mut buf = input;
        for stage in &mut self.stages {
            log::debug!("  stage: {} ({} frames)", stage.name(), buf.frames());
            buf = stage.process(buf);
        }
        buf
    }
}

/// Applies the segment's fade automation, keyed to absolute mix time.
struct EnvelopeStage {
    envelope: GainEnvelope,
    start_frame: usize,
    sample_rate: f64,
}

impl Stage for EnvelopeStage {
    fn name(&self) -> &'static str {
        "gain envelope"
    }

    fn process(&mut self, mut input: StereoBuffer) -> StereoBuffer {
        for i in 0..input.frames() {
            let time = (self.start_frame + i) as f64 / self.sample_rate;
            let gain = self.envelope.gain_at(time) as f32;
            input.left[i] *= gain;
            input.right[i] *= gain;
        }
        input
    }
}

struct ShelfStage {
    name: &'static str,
    left: ShelfFilter,
    right: ShelfFilter,
}

impl ShelfStage {
    fn new(kind: ShelfKind, frequency: f64, gain_db: f64, sample_rate: f64) -> Self {
        let filter = ShelfFilter::new(kind, frequency, gain_db, sample_rate);
        Self {
            name: match kind {
                ShelfKind::Low => "low shelf",
                ShelfKind::High => "high shelf",
            },
            left: filter.clone(),
            right: filter,
        }
    }
}

impl Stage for ShelfStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&mut self, mut input: StereoBuffer) -> StereoBuffer {
        self.left.process_block(&mut input.left);
        self.right.process_block(&mut input.right);
        input
    }
}

struct CompressorStage {
    name: &'static str,
    compressor: Compressor,
}

impl CompressorStage {
    fn new(name: &'static str, params: CompressorParams, sample_rate: f64) -> Self {
        Self {
            name,
            compressor: Compressor::new(params, sample_rate),
        }
    }
}

impl Stage for CompressorStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&mut self, mut input: StereoBuffer) -> StereoBuffer {
        self.compressor.process_block(&mut input.left, &mut input.right);
        log::debug!(
            "  {}: {:.1} dB reduction at block end",
            self.name,
            self.compressor.gain_reduction_db()
        );
        input
    }
}

struct GainStage {
    gain: f32,
}

impl Stage for GainStage {
    fn name(&self) -> &'static str {
        "makeup gain"
    }

    fn process(&mut self, mut input: StereoBuffer) -> StereoBuffer {
        for s in input.left.iter_mut().chain(input.right.iter_mut()) {
            *s *= self.gain;
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> TimelineSegment {
        TimelineSegment {
            track: 0,
            start: 0.0,
            duration: 1.0,
            fade_in: 0.5,
            fade_out: 0.5,
        }
    }

    #[test]
    fn track_chain_order() {
        let chain = Chain::track(&segment(), 0, 1000);
        assert_eq!(
            chain.stage_names(),
            vec!["gain envelope", "low shelf", "high shelf", "track compressor"]
        );
    }

    #[test]
    fn master_chain_order() {
        let chain = Chain::master(1000, 1.8);
        assert_eq!(
            chain.stage_names(),
            vec!["master compressor", "limiter", "makeup gain"]
        );
    }

    #[test]
    fn master_chain_applies_makeup_to_quiet_signal() {
        // Far below every threshold, only the makeup gain matters.
        let mut buf = StereoBuffer::silent(2000, 44100);
        buf.left.iter_mut().for_each(|s| *s = 0.001);
        let out = Chain::master(44100, 1.8).run(buf);
        assert!((out.left[1999] - 0.0018).abs() < 1e-6, "got {}", out.left[1999]);
        assert_eq!(out.right[1999], 0.0);
    }

    #[test]
    fn silence_stays_silent_through_track_chain() {
        let buf = StereoBuffer::silent(1000, 1000);
        let out = Chain::track(&segment(), 0, 1000).run(buf);
        assert!(out.left.iter().chain(&out.right).all(|&s| s == 0.0));
    }

    #[test]
    fn envelope_stage_uses_absolute_time() {
        let seg = TimelineSegment {
            track: 0,
            start: 1.0,
            duration: 2.0,
            fade_in: 1.0,
            fade_out: 0.5,
        };
        let mut stage = EnvelopeStage {
            envelope: GainEnvelope::from_segment(&seg),
            start_frame: 10,
            sample_rate: 10.0,
        };
        let mut buf = StereoBuffer::silent(20, 10);
        buf.left.iter_mut().for_each(|s| *s = 1.0);
        let out = stage.process(buf);
        assert_eq!(out.left[0], 0.0);
        assert!((out.left[5] - 0.5).abs() < 1e-6);
        assert_eq!(out.left[12], 1.0);
    }
}
