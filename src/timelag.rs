//! Diagonal enhancement of affinity graphs via the time-lag domain.
//!
//! A repeated section shows up in a self-similarity matrix as a stripe
//! parallel to the main diagonal: beat `t` matches beat `t + l` for a run
//! of consecutive `t` at a fixed lag `l`. Re-indexing from (beat, beat)
//! into (lag, beat) coordinates turns those stripes into horizontal runs,
//! where a 1-D median filter along the beat axis suppresses isolated
//! spurious matches while leaving genuine runs intact.

use ndarray::Array2;

use crate::filt::median_filter_circular;
use crate::{Error, Result};

fn require_square(matrix: &Array2<f32>) -> Result<usize> {
    let (rows, cols) = (matrix.shape()[0], matrix.shape()[1]);
    if rows == 0 || cols == 0 {
        return Err(Error::EmptyFeatures);
    }
    if rows != cols {
        return Err(Error::ShapeMismatch {
            expected: format!("square matrix ({rows} x {rows})"),
            got: format!("{rows} x {cols}"),
        });
    }
    Ok(rows)
}

/// Re-index a recurrence matrix from (beat, beat) into (lag, beat) space.
///
/// `lag[(l, t)] = rec[(t, (t + l) mod n)]` — a circular coordinate
/// transform, inverted exactly by [`lag_to_recurrence`].
pub fn recurrence_to_lag(rec: &Array2<f32>) -> Result<Array2<f32>> {
    let n = require_square(rec)?;
    let mut lag = Array2::<f32>::zeros((n, n));
    for l in 0..n {
        for t in 0..n {
            lag[(l, t)] = rec[(t, (t + l) % n)];
        }
    }
    Ok(lag)
}

/// Inverse of [`recurrence_to_lag`].
pub fn lag_to_recurrence(lag: &Array2<f32>) -> Result<Array2<f32>> {
    let n = require_square(lag)?;
    let mut rec = Array2::<f32>::zeros((n, n));
    for l in 0..n {
        for t in 0..n {
            rec[(t, (t + l) % n)] = lag[(l, t)];
        }
    }
    Ok(rec)
}

/// Reinforce diagonal structure in an affinity graph.
///
/// Applies a circular median filter of length `window` along the beat
/// axis of every lag row, then re-indexes back to (beat, beat) space.
/// Shape is preserved; symmetry is preserved exactly, because symmetric
/// entries land in mirrored lag rows whose filter windows contain the
/// same value multiset.
///
/// # Arguments
/// * `affinity` - Square affinity matrix (n_beats x n_beats)
/// * `window` - Median filter length, odd (7 in the default pipeline)
///
/// # Example
/// ```
/// use ndarray::Array2;
/// use refrain::timelag::enhance_diagonals;
///
/// let eye = Array2::from_diag_elem(8, 1.0);
/// let enhanced = enhance_diagonals(&eye, 3).unwrap();
/// assert_eq!(enhanced, eye);
/// ```
pub fn enhance_diagonals(affinity: &Array2<f32>, window: usize) -> Result<Array2<f32>> {
    require_square(affinity)?;
    if window == 0 || window % 2 == 0 {
        return Err(Error::InvalidParameter {
            name: "window",
            value: window.to_string(),
            reason: "median filter length must be odd".to_string(),
        });
    }

    let mut lag = recurrence_to_lag(affinity)?;
    let n = lag.shape()[1];
    for l in 0..lag.shape()[0] {
        let row: Vec<f32> = (0..n).map(|t| lag[(l, t)]).collect();
        let filtered = median_filter_circular(&row, window);
        for (t, value) in filtered.into_iter().enumerate() {
            lag[(l, t)] = value;
        }
    }
    lag_to_recurrence(&lag)
}
