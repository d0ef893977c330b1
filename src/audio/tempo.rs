//! Interval-histogram tempo estimation.
//!
//! This is a coarse heuristic, not a beat tracker: inter-peak intervals are
//! rounded to 100-sample buckets, the most frequent bucket wins, and the
//! resulting BPM is folded into 60..=180 with a 120 BPM fallback.

/// Width of one histogram bucket, in samples.
pub const INTERVAL_BUCKET: usize = 100;
pub const MIN_BPM: u32 = 60;
pub const MAX_BPM: u32 = 180;
pub const FALLBACK_BPM: u32 = 120;

/// Estimate BPM from ascending peak positions.
pub fn estimate_bpm(peaks: &[usize], sample_rate: u32) -> u32 {
    let Some(interval) = dominant_interval(peaks) else {
        return FALLBACK_BPM;
    };

    let raw = (60.0 / (interval as f64 / sample_rate as f64)).round();
    correct_bpm(raw)
}

/// Most frequent bucketed interval between consecutive peaks.
///
/// Ties go to the bucket that first reached the winning count during a
/// single pass over buckets in order of first appearance.
pub fn dominant_interval(peaks: &[usize]) -> Option<usize> {
    // (bucket, count) in first-seen order
    let mut histogram: Vec<(usize, usize)> = Vec::new();

    for pair in peaks.windows(2) {
        let delta = pair[1] - pair[0];
        let bucket = ((delta as f64 / INTERVAL_BUCKET as f64).round() as usize) * INTERVAL_BUCKET;
        match histogram.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, count)) => *count += 1,
            None => histogram.push((bucket, 1)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for &(bucket, count) in &histogram {
        if best.map_or(true, |(_, max)| count > max) {
            best = Some((bucket, count));
        }
    }

    best.map(|(bucket, _)| bucket).filter(|&b| b > 0)
}

/// Octave correction. Slow tempos are doubled and fast ones halved (both
/// tested against the uncorrected value). A result still outside 60..=180
/// after that single fold, or a non-finite input, becomes the 120 fallback.
pub fn correct_bpm(bpm: f64) -> u32 {
    if !bpm.is_finite() {
        return FALLBACK_BPM;
    }

    let mut corrected = bpm;
    if bpm < MIN_BPM as f64 {
        corrected = bpm * 2.0;
    }
    if bpm > MAX_BPM as f64 {
        corrected = bpm / 2.0;
    }

    // Halving an odd BPM lands on .5
    let corrected = corrected.round();
    if corrected < MIN_BPM as f64 || corrected > MAX_BPM as f64 {
        return FALLBACK_BPM;
    }
    corrected as u32
}
