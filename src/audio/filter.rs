/// One-pole low-pass (exponential smoothing). Used ahead of peak picking to
/// keep the kick/bass energy and drop everything above `cutoff_hz`.
///
/// `sample_rate` and `cutoff_hz` must both be positive.
pub fn low_pass(samples: &[f32], sample_rate: u32, cutoff_hz: f64) -> Vec<f32> {
    debug_assert!(sample_rate > 0 && cutoff_hz > 0.0);

    let rc = 1.0 / (cutoff_hz * 2.0 * std::f64::consts::PI);
    let dt = 1.0 / sample_rate as f64;
    let alpha = dt / (rc + dt);

    let mut filtered = Vec::with_capacity(samples.len());
    let Some(&first) = samples.first() else {
        return filtered;
    };
    filtered.push(first);

    let mut prev = first;
    for &x in &samples[1..] {
        let y = (prev as f64 + alpha * (x as f64 - prev as f64)) as f32;
        filtered.push(y);
        prev = y;
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_length_and_first_sample() {
        let input = vec![0.5, -0.25, 1.0, 0.0];
        let out = low_pass(&input, 44100, 150.0);
        assert_eq!(out.len(), input.len());
        assert_eq!(out[0], 0.5);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(low_pass(&[], 44100, 150.0).is_empty());
    }

    #[test]
    fn converges_to_dc() {
        let mut input = vec![0.0f32];
        input.extend(std::iter::repeat(1.0).take(20_000));
        let out = low_pass(&input, 44100, 150.0);
        assert!((out[out.len() - 1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn attenuates_high_frequency() {
        // Alternating +-1 is the Nyquist tone.
        let input: Vec<f32> = (0..4096).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let out = low_pass(&input, 44100, 150.0);
        let tail_peak = out[2048..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < 0.05, "got {tail_peak}");
    }
}
