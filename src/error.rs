/// Crate-level error type for the refrain segmentation library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A feature matrix is empty when non-empty data was required.
    #[error("feature matrix is empty")]
    EmptyFeatures,

    /// Input array has incorrect shape for the operation.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// A required dimension is zero or invalid.
    #[error("invalid size for `{name}`: {value} ({reason})")]
    InvalidSize {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    /// An affinity or Laplacian matrix is asymmetric beyond tolerance.
    #[error("matrix is not symmetric: max |A - A'| = {max_delta}")]
    Asymmetric { max_delta: f32 },

    /// Symmetric eigendecomposition did not converge.
    #[error("eigendecomposition did not converge within {max_iter} iterations")]
    EigenNonConvergence { max_iter: usize },

    /// More embedding components requested than usable eigenvectors.
    #[error("requested {requested} embedding components but only {available} eigenvectors are usable")]
    TooManyComponents { requested: usize, available: usize },

    /// Cluster count incompatible with the number of points.
    #[error("cannot form {k} clusters from {n_points} points")]
    ClusterCount { k: usize, n_points: usize },

    /// No k-means restart stabilized within the iteration budget.
    #[error("k-means did not converge within {max_iter} iterations in any of {restarts} restarts")]
    ClusteringNonConvergence { max_iter: usize, restarts: usize },
}

/// Coarse failure category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or empty inputs, out-of-range parameters.
    InvalidInput,
    /// Numerical failures in the Laplacian/eigendecomposition stages.
    Numerical,
    /// Failures in the clustering stage.
    Clustering,
}

impl Error {
    /// The coarse category this error belongs to.
    ///
    /// # Example
    /// ```
    /// use refrain::{Error, ErrorKind};
    ///
    /// let err = Error::EmptyFeatures;
    /// assert_eq!(err.kind(), ErrorKind::InvalidInput);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameter { .. }
            | Error::EmptyFeatures
            | Error::ShapeMismatch { .. }
            | Error::InvalidSize { .. } => ErrorKind::InvalidInput,
            Error::Asymmetric { .. }
            | Error::EigenNonConvergence { .. }
            | Error::TooManyComponents { .. } => ErrorKind::Numerical,
            Error::ClusterCount { .. } | Error::ClusteringNonConvergence { .. } => {
                ErrorKind::Clustering
            }
        }
    }
}

/// Convenience Result type for refrain operations.
pub type Result<T> = std::result::Result<T, Error>;
