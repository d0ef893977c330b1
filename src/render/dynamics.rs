//! Feed-forward compressor/limiter with a stereo-linked peak detector.
//!
//! Parameters mirror the usual threshold / knee / ratio / attack / release
//! set. A limiter is just a hard-knee compressor with a high ratio.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    /// dB
    pub threshold: f64,
    /// dB, 0 = hard knee
    pub knee: f64,
    pub ratio: f64,
    /// seconds
    pub attack: f64,
    /// seconds
    pub release: f64,
}

pub const TRACK_COMPRESSOR: CompressorParams = CompressorParams {
    threshold: -30.0,
    knee: 12.0,
    ratio: 3.0,
    attack: 0.01,
    release: 0.25,
};

pub const MASTER_COMPRESSOR: CompressorParams = CompressorParams {
    threshold: -24.0,
    knee: 30.0,
    ratio: 4.0,
    attack: 0.003,
    release: 0.25,
};

pub const MASTER_LIMITER: CompressorParams = CompressorParams {
    threshold: -1.0,
    knee: 0.0,
    ratio: 20.0,
    attack: 0.001,
    release: 0.1,
};

#[derive(Debug, Clone)]
pub struct Compressor {
    params: CompressorParams,
    attack_coef: f64,
    release_coef: f64,
    envelope: f64,
}

impl Compressor {
    pub fn new(params: CompressorParams, sample_rate: f64) -> Self {
        Self {
            params,
            attack_coef: (-1.0 / (params.attack * sample_rate)).exp(),
            release_coef: (-1.0 / (params.release * sample_rate)).exp(),
            envelope: 0.0,
        }
    }

    #[inline]
    fn linear_to_db(linear: f64) -> f64 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    #[inline]
    fn db_to_linear(db: f64) -> f64 {
        10.0_f64.powf(db / 20.0)
    }

    /// Gain change in dB (<= 0) for a detector level in dB.
    fn gain_reduction(&self, input_db: f64) -> f64 {
        let CompressorParams { threshold, knee, ratio, .. } = self.params;
        let slope = 1.0 - 1.0 / ratio;

        if knee <= 0.0 {
            if input_db <= threshold {
                0.0
            } else {
                (threshold - input_db) * slope
            }
        } else {
            let half_knee = knee / 2.0;
            let knee_start = threshold - half_knee;
            let knee_end = threshold + half_knee;

            if input_db <= knee_start {
                0.0
            } else if input_db >= knee_end {
                (threshold - input_db) * slope
            } else {
                // quadratic blend across the knee
                let x = input_db - knee_start;
                -slope * x * x / (2.0 * knee)
            }
        }
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = left.abs().max(right.abs()) as f64;

        let coef = if level > self.envelope {
            self.attack_coef
        } else {
            self.release_coef
        };
        self.envelope = coef * self.envelope + (1.0 - coef) * level;

        let reduction = self.gain_reduction(Self::linear_to_db(self.envelope));
        let gain = Self::db_to_linear(reduction) as f32;

        (left * gain, right * gain)
    }

    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.process(*l, *r);
            *l = out_l;
            *r = out_r;
        }
    }

    /// Current gain reduction in dB, positive for metering.
    pub fn gain_reduction_db(&self) -> f64 {
        -self.gain_reduction(Self::linear_to_db(self.envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    #[test]
    fn passes_signal_below_threshold() {
        let mut comp = Compressor::new(MASTER_LIMITER, SR);
        for _ in 0..5000 {
            comp.process(0.5, 0.5);
        }
        let (l, r) = comp.process(0.5, 0.5);
        assert_eq!((l, r), (0.5, 0.5));
    }

    #[test]
    fn limiter_settles_at_ratio() {
        // 0 dBFS into -1 dB threshold at 20:1 -> -0.95 dB out
        let mut comp = Compressor::new(MASTER_LIMITER, SR);
        for _ in 0..10_000 {
            comp.process(1.0, 1.0);
        }
        let (out, _) = comp.process(1.0, 1.0);
        let expected = 10.0_f64.powf(-0.95 / 20.0) as f32;
        assert!((out - expected).abs() < 1e-3, "got {out}, want {expected}");
    }

    #[test]
    fn soft_knee_is_continuous() {
        let comp = Compressor::new(TRACK_COMPRESSOR, SR);
        let below = comp.gain_reduction(-36.0 - 1e-9);
        let at_start = comp.gain_reduction(-36.0 + 1e-9);
        let at_end_inside = comp.gain_reduction(-24.0 - 1e-9);
        let at_end_outside = comp.gain_reduction(-24.0 + 1e-9);
        assert!((below - at_start).abs() < 1e-6);
        assert!((at_end_inside - at_end_outside).abs() < 1e-6);
    }

    #[test]
    fn attack_is_gradual() {
        let mut comp = Compressor::new(TRACK_COMPRESSOR, SR);
        let (first, _) = comp.process(1.0, 1.0);
        for _ in 0..2000 {
            comp.process(1.0, 1.0);
        }
        let (later, _) = comp.process(1.0, 1.0);
        assert!(first > later, "first={first}, later={later}");
    }

    #[test]
    fn releases_after_loud_passage() {
        let mut comp = Compressor::new(MASTER_COMPRESSOR, SR);
        for _ in 0..5000 {
            comp.process(1.0, 1.0);
        }
        let held = comp.gain_reduction_db();
        for _ in 0..88200 {
            comp.process(0.001, 0.001);
        }
        assert!(held > 10.0, "held={held}");
        assert!(comp.gain_reduction_db() < 0.5);
    }

    #[test]
    fn detector_is_stereo_linked() {
        let mut comp = Compressor::new(MASTER_LIMITER, SR);
        for _ in 0..10_000 {
            comp.process(1.0, 0.1);
        }
        let (l, r) = comp.process(1.0, 0.1);
        assert!((l / r - 10.0).abs() < 1e-3);
    }
}
