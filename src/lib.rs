//! Unsupervised musical structure segmentation for Rust.
//!
//! Refrain partitions a recorded track into labeled structural sections
//! (verse/chorus-like regions) by spectral clustering of harmonic
//! self-similarity over time. Per-frame features and beat positions come
//! from an external front end through the [`FeatureSource`] seam; the
//! crate owns everything from beat synchronization to the final labeled
//! segment list.
//!
//! # Pipeline
//!
//! 1. Aggregate per-frame chroma (or MFCC) features per beat
//!    ([`sync::beat_sync`])
//! 2. Build self-similarity graphs over the beat features
//!    ([`recurrence::knn_recurrence`], [`recurrence::local_affinity`])
//! 3. Reinforce diagonal (repetition) structure in the lag domain
//!    ([`timelag::enhance_diagonals`])
//! 4. Embed the graph via its normalized Laplacian eigenvectors
//!    ([`spectral::embed`])
//! 5. Cluster beats and emit contiguous labeled segments
//!    ([`cluster::kmeans`], [`cluster::labels_to_segments`])
//!
//! [`Segmenter`] wires the stages together behind one configuration
//! builder.
//!
//! # Quick Start
//!
//! ```rust
//! use ndarray::Array2;
//! use refrain::{Segmenter, TrackFeatures};
//!
//! // Two alternating sections of identical beats, 4 frames per beat.
//! let n_frames = 96;
//! let mut chroma = Array2::<f32>::zeros((12, n_frames));
//! for t in 0..n_frames {
//!     let section = (t / 24) % 2;
//!     chroma[(section * 5, t)] = 1.0;
//! }
//! let features = TrackFeatures {
//!     sample_rate: 22050,
//!     hop_length: 512,
//!     n_frames,
//!     beat_frames: (0..n_frames).step_by(4).collect(),
//!     chroma: chroma.clone(),
//!     mfcc: chroma,
//! };
//!
//! let result = Segmenter::new()
//!     .with_k(2)
//!     .with_embed_skip(0)
//!     .segment(&features)
//!     .unwrap();
//! assert_eq!(result.segments[0].start, 0.0);
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`features`] | Input feature bundle and the front-end contract |
//! | [`sync`] | Beat-boundary normalization and per-beat aggregation |
//! | [`recurrence`] | Binary recurrence and continuous affinity graphs |
//! | [`timelag`] | Lag-domain re-indexing and diagonal enhancement |
//! | [`spectral`] | Normalized Laplacian, eigendecomposition, embedding |
//! | [`cluster`] | K-means, boundary extraction, agglomerative fallback |
//! | [`segment`] | The end-to-end [`Segmenter`] pipeline |
//! | [`convert`] | Frame/sample/time conversions |
//! | [`filt`] | 1-D median filters |
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. [`Error::kind`] maps every failure to
//! one of three categories: invalid input, numerical, or clustering. The
//! stages never return partial output and never retry internally; with a
//! fixed seed the whole pipeline is deterministic, so callers wanting a
//! different outcome vary the seed or the cluster count.
//!
//! # Safety
//!
//! This crate uses `#![forbid(unsafe_code)]` — no unsafe Rust anywhere.

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Result};

pub mod cluster;
pub mod convert;
pub mod features;
pub mod filt;
pub mod recurrence;
pub mod segment;
pub mod spectral;
pub mod sync;
pub mod timelag;

pub use cluster::Segment;
pub use features::{FeatureSource, TrackFeatures};
pub use segment::{FeatureKind, Segmentation, Segmenter};
