//! Beat-synchronous feature aggregation.

use ndarray::Array2;

use crate::{Error, Result};

/// Reduction applied to the frames inside one beat interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Median,
    Min,
    Max,
}

/// Normalize raw beat frame indices into interval boundaries.
///
/// De-duplicates, clips to `[0, n_frames - 1]`, and pads with a leading 0
/// and a trailing `n_frames` sentinel so that consecutive boundary pairs
/// tile the whole track. The input must be non-decreasing.
///
/// # Returns
/// Strictly increasing boundaries; `len - 1` is the number of beat
/// intervals.
///
/// # Example
/// ```
/// use refrain::sync::fix_beats;
///
/// let bounds = fix_beats(&[0, 5, 5, 12, 20], 25).unwrap();
/// assert_eq!(bounds, vec![0, 5, 12, 20, 25]);
/// ```
pub fn fix_beats(beats: &[usize], n_frames: usize) -> Result<Vec<usize>> {
    if n_frames == 0 {
        return Err(Error::InvalidSize {
            name: "n_frames",
            value: 0,
            reason: "track has no analysis frames",
        });
    }
    for pair in beats.windows(2) {
        if pair[1] < pair[0] {
            return Err(Error::InvalidParameter {
                name: "beats",
                value: format!("{} after {}", pair[1], pair[0]),
                reason: "beat frame indices must be non-decreasing".to_string(),
            });
        }
    }

    // Clipping preserves ordering, so a single dedup pass suffices.
    let mut bounds: Vec<usize> = beats.iter().map(|&b| b.min(n_frames - 1)).collect();
    bounds.dedup();
    if bounds.first() != Some(&0) {
        bounds.insert(0, 0);
    }
    bounds.push(n_frames);
    Ok(bounds)
}

/// Aggregate per-frame features into per-beat features.
///
/// Columns of `features` within each interval `[bounds[i], bounds[i + 1])`
/// of the normalized beat boundaries are reduced with `aggregate`. A
/// degenerate interval collapses during normalization, so every output
/// column reduces at least one frame; no column is ever empty or NaN.
///
/// # Arguments
/// * `features` - Feature matrix (n_dims x n_frames)
/// * `beats` - Raw beat frame indices, non-decreasing
/// * `aggregate` - Per-interval reduction (mean by default in the pipeline)
///
/// # Returns
/// Beat-synchronous matrix (n_dims x n_beats) with
/// `n_beats == fix_beats(beats, n_frames)?.len() - 1`.
///
/// # Example
/// ```
/// use ndarray::Array2;
/// use refrain::sync::{beat_sync, Aggregate};
///
/// let features = Array2::from_shape_vec((1, 4), vec![0.0, 2.0, 4.0, 6.0]).unwrap();
/// let synced = beat_sync(&features, &[0, 2], Aggregate::Mean).unwrap();
/// assert_eq!(synced.shape(), &[1, 2]);
/// assert_eq!(synced[(0, 0)], 1.0);
/// assert_eq!(synced[(0, 1)], 5.0);
/// ```
pub fn beat_sync(
    features: &Array2<f32>,
    beats: &[usize],
    aggregate: Aggregate,
) -> Result<Array2<f32>> {
    let (n_dims, n_frames) = (features.shape()[0], features.shape()[1]);
    if n_dims == 0 || n_frames == 0 {
        return Err(Error::EmptyFeatures);
    }

    let bounds = fix_beats(beats, n_frames)?;
    let n_beats = bounds.len() - 1;
    let mut synced = Array2::<f32>::zeros((n_dims, n_beats));

    for beat in 0..n_beats {
        let start = bounds[beat];
        let end = bounds[beat + 1].min(n_frames);
        for dim in 0..n_dims {
            let mut interval: Vec<f32> = (start..end).map(|t| features[(dim, t)]).collect();
            synced[(dim, beat)] = match aggregate {
                Aggregate::Mean => {
                    let sum: f64 = interval.iter().map(|&v| v as f64).sum();
                    (sum / interval.len() as f64) as f32
                }
                Aggregate::Median => {
                    interval
                        .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                    let mid = interval.len() / 2;
                    if interval.len() % 2 == 0 {
                        (interval[mid - 1] + interval[mid]) / 2.0
                    } else {
                        interval[mid]
                    }
                }
                Aggregate::Min => interval.iter().cloned().fold(f32::INFINITY, f32::min),
                Aggregate::Max => interval.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
            };
        }
    }

    Ok(synced)
}
