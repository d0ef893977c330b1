/// Amplitude a filtered sample must exceed to be considered a beat.
pub const PEAK_THRESHOLD: f32 = 0.7;
/// Minimum spacing between two accepted beats, in seconds.
pub const MIN_PEAK_DISTANCE_SECS: f64 = 0.3;

/// Find beat positions (ascending sample indices) in a low-passed signal.
///
/// A candidate must exceed `threshold` and no sample within
/// `[i - min_distance, i + min_distance)` may be louder. After a peak is
/// accepted the scan jumps past its window, so peaks never overlap. Only
/// indices with a full window on both sides are examined.
pub fn detect_peaks(
    filtered: &[f32],
    sample_rate: u32,
    threshold: f32,
    min_distance_secs: f64,
) -> Vec<usize> {
    let min_distance = (sample_rate as f64 * min_distance_secs).floor() as usize;
    let mut peaks = Vec::new();

    if filtered.len() < 2 * min_distance {
        return peaks;
    }
    let end = filtered.len() - min_distance;

    let mut i = min_distance;
    while i < end {
        let value = filtered[i].abs();

        if value > threshold {
            let is_local_max = (i - min_distance..i + min_distance)
                .all(|j| j == i || filtered[j].abs() <= value);

            if is_local_max {
                peaks.push(i);
                i += min_distance;
            }
        }
        i += 1;
    }

    peaks
}
