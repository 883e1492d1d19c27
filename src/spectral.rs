//! Spectral embedding of an affinity graph.
//!
//! The symmetric normalized Laplacian of the enhanced affinity graph
//! encodes its cluster structure in the eigenvectors belonging to the
//! smallest eigenvalues: beats in the same structural section land close
//! together in the low-dimensional eigenvector embedding.

use ndarray::Array2;

use crate::filt::median_filter;
use crate::{Error, Result};

/// Tolerance for the symmetry check on the Laplacian input.
const SYMMETRY_TOL: f32 = 1e-4;

/// Iteration budget for the symmetric eigensolver.
const EIGH_MAX_ITER: usize = 10_000;

/// Embedding configuration.
#[derive(Debug, Clone, Copy)]
pub struct EmbedConfig {
    /// Median filter length applied to each eigenvector along the beat
    /// axis (odd; 1 disables smoothing).
    pub smooth_window: usize,
    /// Number of leading (smallest-eigenvalue) eigenvectors to discard.
    /// The first eigenvector per connected component is near-constant on
    /// that component and carries no intra-section contrast.
    pub skip: usize,
    /// Rescale each beat's embedding by the cumulative L2 norm of its
    /// eigenvector coordinates up to the last selected component.
    pub cumulative_norm: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            smooth_window: 9,
            skip: 2,
            cumulative_norm: false,
        }
    }
}

fn max_asymmetry(matrix: &Array2<f32>) -> f32 {
    let n = matrix.shape()[0];
    let mut max_delta = 0.0f32;
    for i in 0..n {
        for j in (i + 1)..n {
            let delta = (matrix[(i, j)] - matrix[(j, i)]).abs();
            if delta > max_delta {
                max_delta = delta;
            }
        }
    }
    max_delta
}

/// Symmetric normalized graph Laplacian, `L = I - D^(-1/2) A D^(-1/2)`.
///
/// Degrees are row sums of `affinity`. A zero-degree beat (no affinity to
/// anything) contributes a zero normalized row, so its Laplacian row is
/// the identity row rather than a division by zero. Eigenvalues of the
/// result lie in `[0, 2]`.
///
/// # Errors
/// `Asymmetric` if the input deviates from symmetry by more than `1e-4`;
/// `ShapeMismatch` if it is not square.
pub fn normalized_laplacian(affinity: &Array2<f32>) -> Result<Array2<f32>> {
    let (rows, cols) = (affinity.shape()[0], affinity.shape()[1]);
    if rows == 0 || cols == 0 {
        return Err(Error::EmptyFeatures);
    }
    if rows != cols {
        return Err(Error::ShapeMismatch {
            expected: format!("square matrix ({rows} x {rows})"),
            got: format!("{rows} x {cols}"),
        });
    }
    let max_delta = max_asymmetry(affinity);
    if max_delta > SYMMETRY_TOL {
        return Err(Error::Asymmetric { max_delta });
    }

    let n = rows;
    let mut inv_sqrt_degree = vec![0.0f64; n];
    for i in 0..n {
        let degree: f64 = (0..n).map(|j| affinity[(i, j)] as f64).sum();
        if degree > 1e-10 {
            inv_sqrt_degree[i] = 1.0 / degree.sqrt();
        }
    }

    // Fill both triangles from one computed value so the output is
    // symmetric to the bit.
    let mut laplacian = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let normalized =
                inv_sqrt_degree[i] * affinity[(i, j)] as f64 * inv_sqrt_degree[j];
            let value = if i == j {
                (1.0 - normalized) as f32
            } else {
                (-normalized) as f32
            };
            laplacian[(i, j)] = value;
            laplacian[(j, i)] = value;
        }
    }
    Ok(laplacian)
}

/// Full eigendecomposition of a symmetric real matrix.
///
/// Returns eigenvalues sorted ascending and the matching eigenvectors as
/// columns of an (n x n) matrix. Computation runs in f64 through
/// nalgebra's symmetric eigensolver. Eigenvector signs, and the basis
/// within a degenerate eigenspace, are solver-dependent; callers must not
/// rely on them.
pub fn eigh(matrix: &Array2<f32>) -> Result<(Vec<f32>, Array2<f32>)> {
    use nalgebra::{DMatrix, SymmetricEigen};

    let n = matrix.shape()[0];
    if n == 0 || matrix.shape()[1] != n {
        return Err(Error::ShapeMismatch {
            expected: format!("square matrix ({n} x {n})"),
            got: format!("{n} x {}", matrix.shape()[1]),
        });
    }

    let mut symmetric = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            // Average away any residual f32 asymmetry before decomposing.
            symmetric[(i, j)] = (matrix[(i, j)] as f64 + matrix[(j, i)] as f64) / 2.0;
        }
    }

    let eigen = SymmetricEigen::try_new(symmetric, f64::EPSILON, EIGH_MAX_ITER)
        .ok_or(Error::EigenNonConvergence {
            max_iter: EIGH_MAX_ITER,
        })?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[a]
            .partial_cmp(&eigen.eigenvalues[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues: Vec<f32> = order.iter().map(|&i| eigen.eigenvalues[i] as f32).collect();
    let mut eigenvectors = Array2::<f32>::zeros((n, n));
    for (col, &src) in order.iter().enumerate() {
        for row in 0..n {
            eigenvectors[(row, col)] = eigen.eigenvectors[(row, src)] as f32;
        }
    }
    Ok((eigenvalues, eigenvectors))
}

/// Low-dimensional spectral embedding of an affinity graph.
///
/// Computes the normalized Laplacian and its eigendecomposition, median-
/// smooths each eigenvector along the beat axis, and selects eigenvector
/// columns `[skip, skip + n_components)` as the embedding. With
/// `cumulative_norm`, each beat's coordinates are divided by the L2 norm
/// of its eigenvector entries up to the last selected component, making
/// embeddings comparable across tracks.
///
/// # Arguments
/// * `affinity` - Symmetric affinity matrix (n_beats x n_beats)
/// * `n_components` - Embedding dimensionality
/// * `config` - Smoothing/selection options
///
/// # Returns
/// Embedding matrix (n_components x n_beats), one column per beat.
pub fn embed(
    affinity: &Array2<f32>,
    n_components: usize,
    config: &EmbedConfig,
) -> Result<Array2<f32>> {
    if n_components == 0 {
        return Err(Error::InvalidParameter {
            name: "n_components",
            value: "0".to_string(),
            reason: "embedding needs at least one component".to_string(),
        });
    }
    if config.smooth_window % 2 == 0 {
        return Err(Error::InvalidParameter {
            name: "smooth_window",
            value: config.smooth_window.to_string(),
            reason: "median filter length must be odd".to_string(),
        });
    }

    let laplacian = normalized_laplacian(affinity)?;
    let n_beats = laplacian.shape()[0];
    if n_components + config.skip > n_beats {
        return Err(Error::TooManyComponents {
            requested: n_components,
            available: n_beats.saturating_sub(config.skip),
        });
    }
    let (_, mut eigenvectors) = eigh(&laplacian)?;

    if config.smooth_window > 1 {
        for col in 0..n_beats {
            let column: Vec<f32> = (0..n_beats).map(|row| eigenvectors[(row, col)]).collect();
            let smoothed = median_filter(&column, config.smooth_window);
            for (row, value) in smoothed.into_iter().enumerate() {
                eigenvectors[(row, col)] = value;
            }
        }
    }

    let selected = config.skip + n_components;
    let mut embedding = Array2::<f32>::zeros((n_components, n_beats));
    for beat in 0..n_beats {
        let scale = if config.cumulative_norm {
            let cumulative: f64 = (0..selected)
                .map(|col| {
                    let v = eigenvectors[(beat, col)] as f64;
                    v * v
                })
                .sum();
            let norm = cumulative.sqrt();
            if norm > 1e-10 { norm as f32 } else { 1.0 }
        } else {
            1.0
        };
        for component in 0..n_components {
            embedding[(component, beat)] =
                eigenvectors[(beat, config.skip + component)] / scale;
        }
    }
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn ring(n: usize) -> Array2<f32> {
        let mut affinity = Array2::<f32>::zeros((n, n));
        for i in 0..n {
            let j = (i + 1) % n;
            affinity[(i, j)] = 1.0;
            affinity[(j, i)] = 1.0;
        }
        affinity
    }

    #[test]
    fn laplacian_rows_of_connected_graph_sum_to_zero() {
        // For constant degree, D^(-1/2) A D^(-1/2) rows sum to 1.
        let laplacian = normalized_laplacian(&ring(8)).unwrap();
        for i in 0..8 {
            let row_sum: f32 = (0..8).map(|j| laplacian[(i, j)]).sum();
            assert_relative_eq!(row_sum, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_degree_row_becomes_identity_row() {
        let mut affinity = ring(6);
        for j in 0..6 {
            affinity[(2, j)] = 0.0;
            affinity[(j, 2)] = 0.0;
        }
        let laplacian = normalized_laplacian(&affinity).unwrap();
        assert_eq!(laplacian[(2, 2)], 1.0);
        for j in 0..6 {
            if j != 2 {
                assert_eq!(laplacian[(2, j)], 0.0);
            }
        }
    }

    #[test]
    fn asymmetric_input_rejected() {
        let mut affinity = ring(5);
        affinity[(0, 3)] = 0.5;
        let err = normalized_laplacian(&affinity).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Numerical);
    }

    #[test]
    fn eigenvalues_sorted_and_in_range() {
        let laplacian = normalized_laplacian(&ring(10)).unwrap();
        let (eigenvalues, _) = eigh(&laplacian).unwrap();
        for pair in eigenvalues.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        for &value in &eigenvalues {
            assert!(value >= -1e-5 && value <= 2.0 + 1e-5);
        }
        assert_relative_eq!(eigenvalues[0], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn eigenvectors_reconstruct_the_matrix() {
        let laplacian = normalized_laplacian(&ring(6)).unwrap();
        let (eigenvalues, eigenvectors) = eigh(&laplacian).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                let mut reconstructed = 0.0f64;
                for k in 0..6 {
                    reconstructed += eigenvalues[k] as f64
                        * eigenvectors[(i, k)] as f64
                        * eigenvectors[(j, k)] as f64;
                }
                assert_relative_eq!(reconstructed as f32, laplacian[(i, j)], epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn embedding_shape_matches_request() {
        let embedding = embed(&ring(12), 3, &EmbedConfig::default()).unwrap();
        assert_eq!(embedding.shape(), &[3, 12]);
    }

    #[test]
    fn too_many_components_rejected() {
        let err = embed(&ring(6), 5, &EmbedConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Numerical);
    }

    #[test]
    fn cumulative_norm_bounds_coordinates() {
        let config = EmbedConfig {
            smooth_window: 1,
            skip: 0,
            cumulative_norm: true,
        };
        let embedding = embed(&ring(9), 3, &config).unwrap();
        for value in embedding.iter() {
            assert!(value.abs() <= 1.0 + 1e-6);
        }
    }
}
