//! Frame, sample, and time index conversions.

/// Convert frame indices to times (seconds).
///
/// # Example
/// ```
/// use refrain::convert::frames_to_time;
///
/// let times = frames_to_time(&[0, 22050 / 512], 22050, 512);
/// assert!(times[0] == 0.0 && (times[1] - 1.0).abs() < 0.05);
/// ```
pub fn frames_to_time(frames: &[usize], sr: u32, hop_length: usize) -> Vec<f32> {
    frames
        .iter()
        .map(|&f| frame_to_time(f, sr, hop_length))
        .collect()
}

/// Convert a single frame index to a time (seconds).
pub fn frame_to_time(frame: usize, sr: u32, hop_length: usize) -> f32 {
    (frame * hop_length) as f32 / sr as f32
}

/// Convert times (seconds) to frame indices.
pub fn time_to_frames(times: &[f32], sr: u32, hop_length: usize) -> Vec<usize> {
    times
        .iter()
        .map(|&t| ((t * sr as f32) / hop_length as f32).round() as usize)
        .collect()
}

/// Convert frame indices to sample indices.
pub fn frames_to_samples(frames: &[usize], hop_length: usize) -> Vec<usize> {
    frames.iter().map(|&f| f * hop_length).collect()
}
