//! Clustering of beat embeddings into labeled segments.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::convert::frames_to_time;
use crate::{Error, Result};

/// One labeled structural segment, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f32,
    pub end: f32,
    pub label: usize,
}

impl Segment {
    /// Segment length in seconds.
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// K-means configuration.
#[derive(Debug, Clone, Copy)]
pub struct KMeansConfig {
    /// Independent restarts; the labeling with the lowest inertia wins.
    pub n_restarts: usize,
    /// Lloyd iteration cap per restart.
    pub max_iter: usize,
    /// Seed for k-means++ initialization. Identical seed and input yield
    /// identical labels.
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_restarts: 8,
            max_iter: 300,
            seed: 0,
        }
    }
}

fn squared_distance(points: &Array2<f32>, p: usize, center: &[f64]) -> f64 {
    let n_dims = points.shape()[0];
    let mut dist_sq = 0.0f64;
    for d in 0..n_dims {
        let diff = points[(d, p)] as f64 - center[d];
        dist_sq += diff * diff;
    }
    dist_sq
}

/// K-means++ seeding: spread the initial centers out by sampling each new
/// center with probability proportional to squared distance from the
/// centers chosen so far.
fn seed_centers(points: &Array2<f32>, k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n_dims = points.shape()[0];
    let n = points.shape()[1];
    let column = |p: usize| -> Vec<f64> { (0..n_dims).map(|d| points[(d, p)] as f64).collect() };

    let first = rng.gen_range(0..n);
    let mut centers = vec![column(first)];
    let mut chosen = vec![false; n];
    chosen[first] = true;

    while centers.len() < k {
        let mut weights = vec![0.0f64; n];
        let mut total = 0.0f64;
        for p in 0..n {
            let nearest = centers
                .iter()
                .map(|c| squared_distance(points, p, c))
                .fold(f64::INFINITY, f64::min);
            weights[p] = nearest;
            total += nearest;
        }
        let next = if total > 1e-12 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = n - 1;
            for (p, &w) in weights.iter().enumerate() {
                if target < w {
                    pick = p;
                    break;
                }
                target -= w;
            }
            pick
        } else {
            // All remaining mass is on already-chosen points (duplicate
            // data); fall back to the first unchosen index.
            (0..n).find(|&p| !chosen[p]).unwrap_or(0)
        };
        chosen[next] = true;
        centers.push(column(next));
    }
    centers
}

fn lloyd(
    points: &Array2<f32>,
    k: usize,
    max_iter: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, f64, bool) {
    let n_dims = points.shape()[0];
    let n = points.shape()[1];
    let mut centers = seed_centers(points, k, rng);
    let mut labels = vec![0usize; n];
    let mut converged = false;

    for _ in 0..max_iter {
        // Assignment step; ties go to the lowest cluster index.
        let mut changed = false;
        for p in 0..n {
            let mut best = 0usize;
            let mut best_dist = f64::INFINITY;
            for (c, center) in centers.iter().enumerate() {
                let dist_sq = squared_distance(points, p, center);
                if dist_sq < best_dist {
                    best_dist = dist_sq;
                    best = c;
                }
            }
            if labels[p] != best {
                labels[p] = best;
                changed = true;
            }
        }
        if !changed {
            converged = true;
            break;
        }

        // Update step.
        let mut sums = vec![vec![0.0f64; n_dims]; k];
        let mut counts = vec![0usize; k];
        for p in 0..n {
            counts[labels[p]] += 1;
            for d in 0..n_dims {
                sums[labels[p]][d] += points[(d, p)] as f64;
            }
        }
        for c in 0..k {
            if counts[c] > 0 {
                for d in 0..n_dims {
                    centers[c][d] = sums[c][d] / counts[c] as f64;
                }
            } else {
                // Re-seat an empty cluster on the point farthest from its
                // current center (lowest index on ties).
                let mut farthest = 0usize;
                let mut farthest_dist = -1.0f64;
                for p in 0..n {
                    let dist_sq = squared_distance(points, p, &centers[labels[p]]);
                    if dist_sq > farthest_dist {
                        farthest_dist = dist_sq;
                        farthest = p;
                    }
                }
                centers[c] = (0..n_dims).map(|d| points[(d, farthest)] as f64).collect();
            }
        }
    }

    let inertia: f64 = (0..n)
        .map(|p| squared_distance(points, p, &centers[labels[p]]))
        .sum();
    (labels, inertia, converged)
}

/// Partition beat embedding vectors into `k` clusters.
///
/// Each column of `points` is one beat. Runs `n_restarts` independent
/// k-means++ initializations and keeps the converged labeling with the
/// lowest total within-cluster distortion.
///
/// # Errors
/// `InvalidParameter` for `k == 0`; `ClusterCount` for `k` exceeding the
/// number of beats; `ClusteringNonConvergence` if no restart stabilizes
/// within the iteration budget.
pub fn kmeans(points: &Array2<f32>, k: usize, config: &KMeansConfig) -> Result<Vec<usize>> {
    let n = points.shape()[1];
    if points.shape()[0] == 0 || n == 0 {
        return Err(Error::EmptyFeatures);
    }
    if k == 0 {
        return Err(Error::InvalidParameter {
            name: "k",
            value: "0".to_string(),
            reason: "cluster count must be positive".to_string(),
        });
    }
    if k > n {
        return Err(Error::ClusterCount { k, n_points: n });
    }

    let restarts = config.n_restarts.max(1);
    let mut best: Option<(Vec<usize>, f64)> = None;
    for restart in 0..restarts {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(restart as u64));
        let (labels, inertia, converged) = lloyd(points, k, config.max_iter.max(1), &mut rng);
        if !converged {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, best_inertia)) => inertia < *best_inertia,
        };
        if better {
            best = Some((labels, inertia));
        }
    }

    match best {
        Some((labels, _)) => Ok(labels),
        None => Err(Error::ClusteringNonConvergence {
            max_iter: config.max_iter,
            restarts,
        }),
    }
}

/// Beat indices that start a new segment: beat 0, plus every beat whose
/// label differs from its predecessor.
pub fn boundary_beats(labels: &[usize]) -> Vec<usize> {
    let mut boundaries = vec![0];
    for beat in 1..labels.len() {
        if labels[beat] != labels[beat - 1] {
            boundaries.push(beat);
        }
    }
    boundaries
}

/// Convert a per-beat label sequence into contiguous labeled segments.
///
/// Boundary beats map to frames through the normalized beat boundaries
/// (`bounds`, as produced by [`crate::sync::fix_beats`]); the final
/// boundary clamps to the last valid frame so the segments cover the
/// whole track. Each segment carries the label of its first beat.
///
/// # Arguments
/// * `labels` - One cluster id per beat
/// * `bounds` - Normalized beat boundaries, `labels.len() + 1` entries
/// * `sr`, `hop_length` - Time base for frame-to-seconds conversion
/// * `n_frames` - Total frame count, for the final clamp
pub fn labels_to_segments(
    labels: &[usize],
    bounds: &[usize],
    sr: u32,
    hop_length: usize,
    n_frames: usize,
) -> Result<Vec<Segment>> {
    if labels.is_empty() {
        return Err(Error::EmptyFeatures);
    }
    if bounds.len() != labels.len() + 1 {
        return Err(Error::ShapeMismatch {
            expected: format!("{} beat boundaries", labels.len() + 1),
            got: format!("{}", bounds.len()),
        });
    }
    if n_frames == 0 {
        return Err(Error::InvalidSize {
            name: "n_frames",
            value: 0,
            reason: "track has no analysis frames",
        });
    }

    let starts = boundary_beats(labels);
    let mut frames: Vec<usize> = starts.iter().map(|&beat| bounds[beat]).collect();
    frames.push(bounds[labels.len()]);
    let last = frames.len() - 1;
    frames[last] = frames[last].min(n_frames - 1);

    let times = frames_to_time(&frames, sr, hop_length);
    let segments = starts
        .iter()
        .enumerate()
        .map(|(i, &beat)| Segment {
            start: times[i],
            end: times[i + 1],
            label: labels[beat],
        })
        .collect();
    Ok(segments)
}

/// Bottom-up contiguous segmentation by constrained Ward agglomeration.
///
/// Starts from one segment per column and repeatedly merges the cheapest
/// adjacent pair until `k` segments remain. Only adjacent segments may
/// merge, so the result is always a contiguous partition of the timeline.
/// This is the boundary-only alternative to the spectral pipeline: it
/// finds change points but does not relate repeated sections to each
/// other.
///
/// # Returns
/// Left-boundary column indices, always starting with 0.
pub fn agglomerative(data: &Array2<f32>, k: usize) -> Vec<usize> {
    let n_dims = data.shape()[0];
    let n = data.shape()[1];
    if n == 0 || k == 0 {
        return vec![0];
    }
    if k >= n {
        return (0..n).collect();
    }

    // Per-segment running sums; means are derived on demand, so merges
    // are O(n_dims).
    struct Run {
        start: usize,
        len: usize,
        sum: Vec<f64>,
    }
    let mut runs: Vec<Run> = (0..n)
        .map(|t| Run {
            start: t,
            len: 1,
            sum: (0..n_dims).map(|d| data[(d, t)] as f64).collect(),
        })
        .collect();

    let ward = |a: &Run, b: &Run| -> f64 {
        let mut gap_sq = 0.0f64;
        for d in 0..n_dims {
            let diff = a.sum[d] / a.len as f64 - b.sum[d] / b.len as f64;
            gap_sq += diff * diff;
        }
        gap_sq * (a.len * b.len) as f64 / (a.len + b.len) as f64
    };

    while runs.len() > k {
        let mut cheapest = 0usize;
        let mut cheapest_cost = f64::INFINITY;
        for i in 0..runs.len() - 1 {
            let cost = ward(&runs[i], &runs[i + 1]);
            if cost < cheapest_cost {
                cheapest_cost = cost;
                cheapest = i;
            }
        }
        let absorbed = runs.remove(cheapest + 1);
        runs[cheapest].len += absorbed.len;
        for d in 0..n_dims {
            runs[cheapest].sum[d] += absorbed.sum[d];
        }
    }

    runs.iter().map(|run| run.start).collect()
}
