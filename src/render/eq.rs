//! Shelving EQ. Biquad in Direct Form II Transposed with the Audio EQ
//! Cookbook (Robert Bristow-Johnson) shelf coefficients at slope S = 1.

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShelfKind {
    /// Boost/cut below the corner frequency
    Low,
    /// Boost/cut above the corner frequency
    High,
}

#[derive(Debug, Clone)]
pub struct ShelfFilter {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,
}

impl ShelfFilter {
    pub fn new(kind: ShelfKind, frequency: f64, gain_db: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);

        // Corner at or past Nyquist: the shelf covers either nothing or
        // the whole band.
        if frequency >= sample_rate / 2.0 {
            return match kind {
                ShelfKind::Low => Self::flat(a * a),
                ShelfKind::High => Self::flat(1.0),
            };
        }
        let w0 = 2.0 * PI * frequency / sample_rate;
        let cos_w0 = w0.cos();
        // S = 1 reduces the cookbook slope term to sqrt(2)
        let alpha = w0.sin() / 2.0 * 2.0_f64.sqrt();
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let (b0, b1, b2, a0, a1, a2) = match kind {
            ShelfKind::Low => (
                a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
            ShelfKind::High => (
                a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ),
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn flat(gain: f64) -> Self {
        Self {
            b0: gain,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    pub fn process_block(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s as f64) as f32;
        }
    }
}
