//! 1-D median filtering.

use std::cmp::Ordering;

fn median_of(window: &mut [f32]) -> f32 {
    window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    window[window.len() / 2]
}

/// Median filter with truncated windows at the signal edges.
///
/// Each value is replaced by the median of its `window`-sized
/// neighborhood; near the edges the window shrinks to the available
/// samples. Window length should be odd.
///
/// # Example
/// ```
/// use refrain::filt::median_filter;
///
/// let noisy = vec![1.0, 1.0, 9.0, 1.0, 1.0];
/// assert_eq!(median_filter(&noisy, 3), vec![1.0, 1.0, 1.0, 1.0, 1.0]);
/// ```
pub fn median_filter(signal: &[f32], window: usize) -> Vec<f32> {
    let n = signal.len();
    if n == 0 || window <= 1 {
        return signal.to_vec();
    }
    let half = window / 2;
    let mut filtered = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let mut values: Vec<f32> = signal[start..end].to_vec();
        filtered.push(median_of(&mut values));
    }
    filtered
}

/// Median filter with circular (wrap-around) windows.
///
/// Used for lag-domain rows, where the coordinate is periodic; wrapping
/// keeps the filter a pure function of the window multiset, which is what
/// makes diagonal enhancement exactly symmetry-preserving.
pub fn median_filter_circular(signal: &[f32], window: usize) -> Vec<f32> {
    let n = signal.len();
    if n == 0 || window <= 1 {
        return signal.to_vec();
    }
    let window = window.min(n);
    let half = window / 2;
    let mut filtered = Vec::with_capacity(n);
    for i in 0..n {
        let mut values: Vec<f32> = (0..window)
            .map(|offset| signal[(i + n + offset - half) % n])
            .collect();
        filtered.push(median_of(&mut values));
    }
    filtered
}
