use crate::mix::schedule::TimelineSegment;

/// Piecewise-linear gain automation for one segment: 0 -> 1 over the fade
/// in, hold at 1, then 1 -> 0 over the fade out. Silent outside the
/// segment. When the two fades overlap the lower ramp wins.
#[derive(Clone, Copy, Debug)]
pub struct GainEnvelope {
    start: f64,
    end: f64,
    fade_in: f64,
    fade_out: f64,
}

impl GainEnvelope {
    pub fn from_segment(segment: &TimelineSegment) -> Self {
        Self {
            start: segment.start,
            end: segment.end(),
            fade_in: segment.fade_in,
            fade_out: segment.fade_out,
        }
    }

    pub fn gain_at(&self, time: f64) -> f64 {
        if time < self.start || time >= self.end {
            return 0.0;
        }

        let rise = if self.fade_in > 0.0 {
            ((time - self.start) / self.fade_in).min(1.0)
        } else {
            1.0
        };
        let fall = if self.fade_out > 0.0 {
            ((self.end - time) / self.fade_out).min(1.0)
        } else {
            1.0
        };

        rise.min(fall)
    }
}
