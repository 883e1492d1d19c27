//! Error-path tests across the failure taxonomy.

use ndarray::Array2;
use refrain::cluster::{kmeans, labels_to_segments, KMeansConfig};
use refrain::recurrence::{knn_recurrence, local_affinity, Metric};
use refrain::spectral::{embed, normalized_laplacian, EmbedConfig};
use refrain::sync::{beat_sync, fix_beats, Aggregate};
use refrain::timelag::enhance_diagonals;
use refrain::{ErrorKind, Segmenter, TrackFeatures};

fn ramp(n_dims: usize, n: usize) -> Array2<f32> {
    let mut data = Array2::<f32>::zeros((n_dims, n));
    for d in 0..n_dims {
        for t in 0..n {
            data[(d, t)] = (d * n + t) as f32 * 0.1;
        }
    }
    data
}

// Invalid input

#[test]
fn sync_rejects_empty_features() {
    let empty = Array2::<f32>::zeros((0, 0));
    let err = beat_sync(&empty, &[0, 4], Aggregate::Mean).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn fix_beats_rejects_zero_frames() {
    assert!(fix_beats(&[0, 4], 0).is_err());
}

#[test]
fn fix_beats_rejects_decreasing_input() {
    let err = fix_beats(&[0, 9, 4], 20).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn graphs_reject_empty_input() {
    let empty = Array2::<f32>::zeros((0, 0));
    assert!(knn_recurrence(&empty, None, 1, Metric::Cosine, true).is_err());
    assert!(local_affinity(&empty, None, 1, Metric::Cosine).is_err());
}

#[test]
fn graphs_reject_zero_k() {
    let data = ramp(4, 10);
    let err = knn_recurrence(&data, Some(0), 1, Metric::Cosine, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn enhancer_rejects_even_window() {
    let data = ramp(4, 8);
    let aff = local_affinity(&data, None, 1, Metric::Euclidean).unwrap();
    let err = enhance_diagonals(&aff, 6).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn zero_cluster_count_is_invalid_input() {
    let err = kmeans(&ramp(3, 8), 0, &KMeansConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn boundary_length_mismatch_is_invalid_input() {
    let err = labels_to_segments(&[0, 1, 1], &[0, 4, 8], 22050, 512, 12).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// Numerical

#[test]
fn asymmetric_affinity_is_a_numerical_error() {
    let mut aff = Array2::<f32>::zeros((6, 6));
    aff[(0, 5)] = 1.0;
    let err = normalized_laplacian(&aff).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numerical);
}

#[test]
fn component_overflow_is_a_numerical_error() {
    let data = ramp(4, 6);
    let aff = local_affinity(&data, None, 1, Metric::Euclidean).unwrap();
    let err = embed(&aff, 10, &EmbedConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numerical);
}

// Clustering

#[test]
fn oversubscribed_k_is_a_clustering_error() {
    let err = kmeans(&ramp(3, 4), 9, &KMeansConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Clustering);
}

#[test]
fn pipeline_surfaces_cluster_count_errors() {
    // 6 beats of 4 frames; k far above the beat count.
    let n_frames = 24;
    let features = TrackFeatures {
        sample_rate: 22050,
        hop_length: 512,
        n_frames,
        beat_frames: (0..n_frames).step_by(4).collect(),
        chroma: ramp(12, n_frames),
        mfcc: ramp(20, n_frames),
    };
    let err = Segmenter::new()
        .with_k(40)
        .with_n_components(2)
        .with_embed_skip(0)
        .segment(&features)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Clustering);
}

#[test]
fn pipeline_rejects_inconsistent_bundles() {
    let features = TrackFeatures {
        sample_rate: 22050,
        hop_length: 512,
        n_frames: 30,
        beat_frames: vec![0, 10, 20],
        chroma: ramp(12, 24), // wrong column count
        mfcc: ramp(20, 30),
    };
    let err = Segmenter::new().segment(&features).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
