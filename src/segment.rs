//! End-to-end structure segmentation pipeline.

use log::debug;
use ndarray::Array2;

use crate::cluster::{self, KMeansConfig, Segment};
use crate::features::TrackFeatures;
use crate::recurrence::{knn_recurrence, local_affinity, Metric};
use crate::spectral::{embed, EmbedConfig};
use crate::sync::{beat_sync, fix_beats, Aggregate};
use crate::timelag::enhance_diagonals;
use crate::Result;

/// Which feature matrix drives the self-similarity analysis.
///
/// Chroma emphasizes harmonic repetition (the usual choice for structural
/// sections); MFCC emphasizes timbre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Chroma,
    Mfcc,
}

/// Output of one segmentation run.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Cluster id per beat.
    pub labels: Vec<usize>,
    /// Normalized beat boundary frames (`labels.len() + 1` entries).
    pub beat_bounds: Vec<usize>,
    /// Contiguous labeled segments covering the track.
    pub segments: Vec<Segment>,
    /// Binary k-NN recurrence graph over the synced features, for
    /// downstream inspection and visualization.
    pub recurrence: Array2<f32>,
    /// The spectral embedding the labels were clustered in
    /// (n_components x n_beats).
    pub embedding: Array2<f32>,
}

/// Configurable segmentation pipeline.
///
/// Defaults follow the reference analysis: chroma features under cosine
/// distance, 10 clusters, embedding dimensionality tied to the cluster
/// count unless set explicitly, lag-domain enhancement window 7,
/// eigenvector smoothing window 9.
///
/// # Example
/// ```
/// use refrain::Segmenter;
///
/// let segmenter = Segmenter::new()
///     .with_k(6)
///     .with_seed(7);
/// assert_eq!(segmenter.n_components(), 6);
/// ```
#[derive(Debug, Clone)]
pub struct Segmenter {
    k: usize,
    n_components: Option<usize>,
    feature: FeatureKind,
    metric: Option<Metric>,
    aggregate: Aggregate,
    knn_k: Option<usize>,
    width: usize,
    enhance_window: usize,
    smooth_window: usize,
    embed_skip: usize,
    cumulative_norm: bool,
    seed: u64,
    n_restarts: usize,
    max_iter: usize,
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            k: 10,
            n_components: None,
            feature: FeatureKind::Chroma,
            metric: None,
            aggregate: Aggregate::Mean,
            knn_k: None,
            width: 1,
            enhance_window: 7,
            smooth_window: 9,
            embed_skip: 2,
            cumulative_norm: false,
            seed: 0,
            n_restarts: 8,
            max_iter: 300,
        }
    }

    /// Number of clusters (structural section types).
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Embedding dimensionality. Defaults to `k` when never set.
    pub fn with_n_components(mut self, n_components: usize) -> Self {
        self.n_components = Some(n_components);
        self
    }

    /// Feature matrix to analyze (chroma by default).
    pub fn with_feature(mut self, feature: FeatureKind) -> Self {
        self.feature = feature;
        self
    }

    /// Override the distance metric implied by the feature kind.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Per-beat reduction of frame features.
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Neighbor count for both similarity graphs (default ~sqrt(n_beats)).
    pub fn with_knn_k(mut self, knn_k: usize) -> Self {
        self.knn_k = Some(knn_k);
        self
    }

    /// Minimum temporal separation between linked beats.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Lag-domain median filter length (odd).
    pub fn with_enhance_window(mut self, window: usize) -> Self {
        self.enhance_window = window;
        self
    }

    /// Eigenvector median filter length (odd; 1 disables).
    pub fn with_smooth_window(mut self, window: usize) -> Self {
        self.smooth_window = window;
        self
    }

    /// Leading eigenvectors to discard before taking the embedding.
    pub fn with_embed_skip(mut self, skip: usize) -> Self {
        self.embed_skip = skip;
        self
    }

    /// Cumulative-norm rescaling of the embedding (off by default).
    pub fn with_cumulative_norm(mut self, enabled: bool) -> Self {
        self.cumulative_norm = enabled;
        self
    }

    /// Seed for k-means initialization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// K-means restarts (best converged run wins).
    pub fn with_restarts(mut self, n_restarts: usize) -> Self {
        self.n_restarts = n_restarts;
        self
    }

    /// K-means iteration cap per restart.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Effective embedding dimensionality.
    pub fn n_components(&self) -> usize {
        self.n_components.unwrap_or(self.k)
    }

    fn effective_metric(&self) -> Metric {
        self.metric.unwrap_or(match self.feature {
            FeatureKind::Chroma => Metric::Cosine,
            FeatureKind::Mfcc => Metric::Euclidean,
        })
    }

    /// Run the full pipeline on one track's features.
    ///
    /// Every stage is a pure function of its inputs; the first failure
    /// aborts the run. Identical features, configuration, and seed give
    /// identical output.
    pub fn segment(&self, features: &TrackFeatures) -> Result<Segmentation> {
        features.validate()?;
        let matrix = match self.feature {
            FeatureKind::Chroma => &features.chroma,
            FeatureKind::Mfcc => &features.mfcc,
        };
        let metric = self.effective_metric();

        let beat_bounds = fix_beats(&features.beat_frames, features.n_frames)?;
        let synced = beat_sync(matrix, &features.beat_frames, self.aggregate)?;
        debug!(
            "beat-synchronous features: {} dims x {} beats",
            synced.shape()[0],
            synced.shape()[1]
        );

        let recurrence = knn_recurrence(&synced, self.knn_k, self.width, metric, true)?;
        let affinity = local_affinity(&synced, self.knn_k, self.width, metric)?;
        let enhanced = enhance_diagonals(&affinity, self.enhance_window)?;
        debug!(
            "affinity graph: {} beats, {} non-zero entries after enhancement",
            enhanced.shape()[0],
            enhanced.iter().filter(|&&v| v > 0.0).count()
        );

        let embed_config = EmbedConfig {
            smooth_window: self.smooth_window,
            skip: self.embed_skip,
            cumulative_norm: self.cumulative_norm,
        };
        let embedding = embed(&enhanced, self.n_components(), &embed_config)?;

        let kmeans_config = KMeansConfig {
            n_restarts: self.n_restarts,
            max_iter: self.max_iter,
            seed: self.seed,
        };
        let labels = cluster::kmeans(&embedding, self.k, &kmeans_config)?;
        let segments = cluster::labels_to_segments(
            &labels,
            &beat_bounds,
            features.sample_rate,
            features.hop_length,
            features.n_frames,
        )?;
        debug!("{} segments from {} beats", segments.len(), labels.len());

        Ok(Segmentation {
            labels,
            beat_bounds,
            segments,
            recurrence,
            embedding,
        })
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}
