//! Self-similarity graph construction over beat-synchronous features.
//!
//! Both constructions treat the columns of a beat-synchronous feature
//! matrix as points in feature space and link each beat to its nearest
//! neighbors, skipping candidates closer in time than `width` frames so a
//! beat does not trivially match itself or its immediate surroundings.

use ndarray::Array2;

use crate::{Error, Result};

/// Distance metric between beat feature vectors.
///
/// Cosine matches chroma-like features (energy-invariant pitch profiles);
/// Euclidean matches MFCC-like features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cosine,
    Euclidean,
}

/// Pairwise distances between the columns of `data`.
///
/// Cosine distance is `1 - cosine similarity`; a zero-norm column is
/// treated as maximally distant from everything, including another
/// zero-norm column.
fn pairwise_distances(data: &Array2<f32>, metric: Metric) -> Array2<f32> {
    let n_dims = data.shape()[0];
    let n = data.shape()[1];
    let mut dist = Array2::<f32>::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let d = match metric {
                Metric::Cosine => {
                    let mut dot = 0.0f64;
                    let mut norm_i = 0.0f64;
                    let mut norm_j = 0.0f64;
                    for k in 0..n_dims {
                        let vi = data[(k, i)] as f64;
                        let vj = data[(k, j)] as f64;
                        dot += vi * vj;
                        norm_i += vi * vi;
                        norm_j += vj * vj;
                    }
                    let norm_product = (norm_i * norm_j).sqrt();
                    if norm_product > 1e-10 {
                        (1.0 - dot / norm_product) as f32
                    } else {
                        1.0
                    }
                }
                Metric::Euclidean => {
                    let mut dist_sq = 0.0f64;
                    for k in 0..n_dims {
                        let diff = data[(k, i)] as f64 - data[(k, j)] as f64;
                        dist_sq += diff * diff;
                    }
                    dist_sq.sqrt() as f32
                }
            };
            dist[(i, j)] = d;
            dist[(j, i)] = d;
        }
    }

    dist
}

/// Candidate beats for row `i`: everything at least `width` beats away,
/// ordered nearest first. Ties break toward the lower index, so the
/// neighborhoods are deterministic.
fn nearest_candidates(dist: &Array2<f32>, i: usize, width: usize) -> Vec<(f32, usize)> {
    let n = dist.shape()[0];
    let mut candidates: Vec<(f32, usize)> = (0..n)
        .filter(|&j| i.abs_diff(j) >= width)
        .map(|j| (dist[(i, j)], j))
        .collect();
    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}

fn validate_graph_input(data: &Array2<f32>, width: usize) -> Result<usize> {
    if data.shape()[0] == 0 || data.shape()[1] == 0 {
        return Err(Error::EmptyFeatures);
    }
    if width == 0 {
        return Err(Error::InvalidParameter {
            name: "width",
            value: "0".to_string(),
            reason: "temporal separation must be at least 1 to exclude self-links".to_string(),
        });
    }
    Ok(data.shape()[1])
}

/// Default neighbor count: roughly the square root of the beat count.
fn default_k(n: usize) -> usize {
    (n as f32).sqrt().ceil() as usize
}

/// Binary k-nearest-neighbor recurrence graph.
///
/// Each beat links to its `k` nearest beats by `metric` distance among
/// candidates at temporal separation `>= width`. With `sym`, the result is
/// symmetrized by union: an edge exists if either endpoint selected the
/// other.
///
/// # Arguments
/// * `data` - Beat-synchronous feature matrix (n_dims x n_beats)
/// * `k` - Neighbors per beat; `None` for ~sqrt(n_beats)
/// * `width` - Minimum temporal separation between linked beats (1 = skip
///   self-links only)
/// * `metric` - Distance metric
/// * `sym` - Symmetrize by union
///
/// # Returns
/// An (n_beats x n_beats) matrix with entries exactly 0.0 or 1.0 and a
/// zero diagonal.
///
/// # Example
/// ```
/// use ndarray::Array2;
/// use refrain::recurrence::{knn_recurrence, Metric};
///
/// let data = Array2::from_shape_vec((2, 4), vec![
///     1.0, 0.0, 1.0, 0.0,
///     0.0, 1.0, 0.0, 1.0,
/// ]).unwrap();
/// let rec = knn_recurrence(&data, Some(1), 1, Metric::Cosine, true).unwrap();
/// assert_eq!(rec[(0, 2)], 1.0);
/// assert_eq!(rec[(0, 0)], 0.0);
/// ```
pub fn knn_recurrence(
    data: &Array2<f32>,
    k: Option<usize>,
    width: usize,
    metric: Metric,
    sym: bool,
) -> Result<Array2<f32>> {
    let n = validate_graph_input(data, width)?;
    if let Some(0) = k {
        return Err(Error::InvalidParameter {
            name: "k",
            value: "0".to_string(),
            reason: "neighbor count must be positive".to_string(),
        });
    }
    let k = k.unwrap_or_else(|| default_k(n));

    let dist = pairwise_distances(data, metric);
    let mut rec = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for &(_, j) in nearest_candidates(&dist, i, width).iter().take(k) {
            rec[(i, j)] = 1.0;
        }
    }

    if sym {
        for i in 0..n {
            for j in (i + 1)..n {
                let linked = rec[(i, j)].max(rec[(j, i)]);
                rec[(i, j)] = linked;
                rec[(j, i)] = linked;
            }
        }
    }

    Ok(rec)
}

/// Continuous local affinity graph.
///
/// Within each beat's k-nearest neighborhood (same candidate rule as
/// [`knn_recurrence`]), similarity is a Gaussian kernel of distance,
/// `exp(-d^2 / (sigma_i * sigma_j))`, where `sigma_i` is the median
/// distance from beat `i` to its `k` nearest candidates. The per-row
/// bandwidth adapts the kernel to local density: tight verses and loose
/// jams get comparable affinity scales. The result is symmetrized by
/// averaging with its transpose.
///
/// # Arguments
/// * `data` - Beat-synchronous feature matrix (n_dims x n_beats)
/// * `k` - Neighborhood size; `None` for ~sqrt(n_beats)
/// * `width` - Minimum temporal separation between linked beats
/// * `metric` - Distance metric
///
/// # Returns
/// A symmetric (n_beats x n_beats) matrix with entries in [0, 1] and a
/// zero diagonal.
pub fn local_affinity(
    data: &Array2<f32>,
    k: Option<usize>,
    width: usize,
    metric: Metric,
) -> Result<Array2<f32>> {
    let n = validate_graph_input(data, width)?;
    if let Some(0) = k {
        return Err(Error::InvalidParameter {
            name: "k",
            value: "0".to_string(),
            reason: "neighborhood size must be positive".to_string(),
        });
    }
    let k = k.unwrap_or_else(|| default_k(n));

    let dist = pairwise_distances(data, metric);

    // Per-row bandwidth and neighborhood in one pass over the sorted
    // candidate lists.
    let mut neighborhoods: Vec<Vec<usize>> = Vec::with_capacity(n);
    let mut sigma = vec![1.0f64; n];
    for i in 0..n {
        let candidates = nearest_candidates(&dist, i, width);
        let taken = candidates.len().min(k);
        if taken > 0 {
            sigma[i] = candidates[(taken - 1) / 2].0 as f64;
        }
        neighborhoods.push(candidates.iter().take(taken).map(|&(_, j)| j).collect());
    }

    let mut kernel = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for &j in &neighborhoods[i] {
            let d = dist[(i, j)] as f64;
            let scale = (sigma[i] * sigma[j]).max(1e-10);
            kernel[(i, j)] = (-(d * d) / scale).exp() as f32;
        }
    }

    // Average with the transpose; one-sided links keep half weight.
    let mut affinity = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let value = (kernel[(i, j)] + kernel[(j, i)]) / 2.0;
            affinity[(i, j)] = value;
            affinity[(j, i)] = value;
        }
    }

    Ok(affinity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn alternating(n: usize) -> Array2<f32> {
        let mut data = Array2::<f32>::zeros((2, n));
        for t in 0..n {
            data[(t % 2, t)] = 1.0;
        }
        data
    }

    #[test]
    fn recurrence_is_binary_and_hollow() {
        let rec = knn_recurrence(&alternating(12), Some(3), 1, Metric::Cosine, true).unwrap();
        for i in 0..12 {
            assert_eq!(rec[(i, i)], 0.0);
            for j in 0..12 {
                assert!(rec[(i, j)] == 0.0 || rec[(i, j)] == 1.0);
            }
        }
    }

    #[test]
    fn union_symmetrization_is_symmetric() {
        let rec = knn_recurrence(&alternating(15), None, 1, Metric::Euclidean, true).unwrap();
        for i in 0..15 {
            for j in 0..15 {
                assert_eq!(rec[(i, j)], rec[(j, i)]);
            }
        }
    }

    #[test]
    fn affinity_rewards_identical_beats() {
        let aff = local_affinity(&alternating(10), Some(3), 1, Metric::Cosine).unwrap();
        // Beats two apart repeat the same profile; adjacent beats are
        // orthogonal.
        assert!(aff[(0, 2)] > aff[(0, 1)]);
    }

    #[test]
    fn width_two_skips_adjacent_beats() {
        let rec = knn_recurrence(&alternating(10), Some(2), 2, Metric::Cosine, false).unwrap();
        for i in 0..10usize {
            for j in 0..10usize {
                if i.abs_diff(j) < 2 {
                    assert_eq!(rec[(i, j)], 0.0);
                }
            }
        }
    }

    #[test]
    fn zero_width_rejected() {
        assert!(knn_recurrence(&alternating(8), None, 0, Metric::Cosine, true).is_err());
        assert!(local_affinity(&alternating(8), None, 0, Metric::Cosine).is_err());
    }

    #[test]
    fn single_beat_yields_empty_graph() {
        let data = Array2::<f32>::ones((3, 1));
        let rec = knn_recurrence(&data, None, 1, Metric::Euclidean, true).unwrap();
        assert_eq!(rec.shape(), &[1, 1]);
        assert_eq!(rec[(0, 0)], 0.0);
    }
}
