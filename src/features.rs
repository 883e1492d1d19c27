//! Input features and the front-end contract.
//!
//! The segmentation pipeline is deliberately agnostic about how audio gets
//! decoded and analyzed. A front end (CQT/chroma extractor, MFCC extractor,
//! beat tracker) implements [`FeatureSource`] and hands the pipeline one
//! [`TrackFeatures`] bundle per track; everything downstream is pure
//! matrix arithmetic over that bundle.

use std::path::Path;

use ndarray::Array2;

use crate::{Error, Result};

/// Per-frame analysis features for one track, as produced by a front end.
///
/// Feature matrices are laid out `(n_dims, n_frames)`: one column per
/// analysis frame, rows are feature dimensions (12 for chroma, typically
/// 20-40 for MFCC). Frame indices map to time through `sample_rate` and
/// `hop_length`.
#[derive(Debug, Clone)]
pub struct TrackFeatures {
    /// Sample rate of the decoded waveform.
    pub sample_rate: u32,
    /// Hop length (samples per analysis frame).
    pub hop_length: usize,
    /// Total number of analysis frames.
    pub n_frames: usize,
    /// Frame indices of detected beat onsets, non-decreasing.
    pub beat_frames: Vec<usize>,
    /// Chroma feature matrix (12 x n_frames).
    pub chroma: Array2<f32>,
    /// MFCC feature matrix (n_mfcc x n_frames).
    pub mfcc: Array2<f32>,
}

impl TrackFeatures {
    /// Check internal consistency of the bundle.
    ///
    /// Verifies that the rates are positive, that both feature matrices are
    /// non-empty with one column per frame, and that the beat frame indices
    /// are non-decreasing. Out-of-range beat indices are not an error here;
    /// beat normalization clips them.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidSize {
                name: "sample_rate",
                value: 0,
                reason: "sample rate must be positive",
            });
        }
        if self.hop_length == 0 {
            return Err(Error::InvalidSize {
                name: "hop_length",
                value: 0,
                reason: "hop length must be positive",
            });
        }
        if self.n_frames == 0 {
            return Err(Error::InvalidSize {
                name: "n_frames",
                value: 0,
                reason: "track has no analysis frames",
            });
        }
        for (name, matrix) in [("chroma", &self.chroma), ("mfcc", &self.mfcc)] {
            if matrix.shape()[0] == 0 || matrix.shape()[1] == 0 {
                return Err(Error::EmptyFeatures);
            }
            if matrix.shape()[1] != self.n_frames {
                return Err(Error::ShapeMismatch {
                    expected: format!("{name} with {} columns", self.n_frames),
                    got: format!("{} columns", matrix.shape()[1]),
                });
            }
        }
        for pair in self.beat_frames.windows(2) {
            if pair[1] < pair[0] {
                return Err(Error::InvalidParameter {
                    name: "beat_frames",
                    value: format!("{} after {}", pair[1], pair[0]),
                    reason: "beat frame indices must be non-decreasing".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Track duration in seconds, measured to the last valid frame.
    pub fn duration(&self) -> f32 {
        crate::convert::frame_to_time(self.n_frames.saturating_sub(1), self.sample_rate, self.hop_length)
    }
}

/// Front-end contract consumed by the segmentation pipeline.
///
/// Implementors own audio decoding, spectral transforms, and beat tracking;
/// the pipeline only sees the resulting [`TrackFeatures`].
pub trait FeatureSource {
    /// Load and analyze the track at `path`.
    fn load_features(&self, path: &Path) -> Result<TrackFeatures>;
}
