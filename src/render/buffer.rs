use crate::audio::decode::DecodedTrack;

/// Planar 2-channel float audio.
#[derive(Clone, Debug, PartialEq)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

impl StereoBuffer {
    pub fn silent(frames: usize, sample_rate: u32) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
            sample_rate,
        }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// The first `frames` frames of a track as stereo. Mono is duplicated,
    /// channels past the second are dropped, and anything beyond the end
    /// of the source is silence.
    pub fn from_track(track: &DecodedTrack, frames: usize) -> Self {
        let left_src = track.primary();
        let right_src = track.channel(1).unwrap_or(left_src);

        let take = frames.min(track.frames());
        let mut buf = Self::silent(frames, track.sample_rate);
        buf.left[..take].copy_from_slice(&left_src[..take]);
        buf.right[..take].copy_from_slice(&right_src[..take]);
        buf
    }

    /// Add `other` into this buffer starting at frame `offset`. Returns
    /// false (and leaves `self` untouched) if it would not fit.
    pub fn mix_in(&mut self, other: &StereoBuffer, offset: usize) -> bool {
        if offset + other.frames() > self.frames() {
            return false;
        }
        for (dst, src) in self.left[offset..].iter_mut().zip(&other.left) {
            *dst += src;
        }
        for (dst, src) in self.right[offset..].iter_mut().zip(&other.right) {
            *dst += src;
        }
        true
    }

    pub fn is_finite(&self) -> bool {
        self.left.iter().chain(&self.right).all(|s| s.is_finite())
    }

    /// Frame-interleaved samples (L, R, L, R, ...).
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frames() * 2);
        for (&l, &r) in self.left.iter().zip(&self.right) {
            out.push(l);
            out.push(r);
        }
        out
    }
}
