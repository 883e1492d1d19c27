//! End-to-end pipeline tests on synthetic tracks.

use ndarray::Array2;
use refrain::cluster::{boundary_beats, kmeans, KMeansConfig};
use refrain::recurrence::{local_affinity, Metric};
use refrain::spectral::{embed, EmbedConfig};
use refrain::sync::{beat_sync, fix_beats, Aggregate};
use refrain::timelag::enhance_diagonals;
use refrain::{Segmenter, TrackFeatures};

/// A track whose beats cycle through `sections`, each entry naming the
/// chroma pitch class that dominates the section and how many beats it
/// lasts. `frames_per_beat` frames per beat.
fn synthetic_track(sections: &[(usize, usize)], frames_per_beat: usize) -> TrackFeatures {
    let n_beats: usize = sections.iter().map(|&(_, beats)| beats).sum();
    let n_frames = n_beats * frames_per_beat;
    let mut chroma = Array2::<f32>::zeros((12, n_frames));
    let mut mfcc = Array2::<f32>::zeros((20, n_frames));

    let mut beat = 0;
    for &(pitch_class, beats) in sections {
        for _ in 0..beats {
            for offset in 0..frames_per_beat {
                let t = beat * frames_per_beat + offset;
                chroma[(pitch_class % 12, t)] = 1.0;
                chroma[((pitch_class + 7) % 12, t)] = 0.5;
                mfcc[(pitch_class % 20, t)] = 1.0;
            }
            beat += 1;
        }
    }

    TrackFeatures {
        sample_rate: 22050,
        hop_length: 512,
        n_frames,
        beat_frames: (0..n_frames).step_by(frames_per_beat).collect(),
        chroma,
        mfcc,
    }
}

/// Two clearly distinct 10-beat blocks: the spectral path must recover the
/// single boundary between them.
fn two_block_matrix() -> Array2<f32> {
    let mut data = Array2::<f32>::zeros((12, 20));
    for beat in 0..10 {
        data[(0, beat)] = 1.0;
        data[(1, 10 + beat)] = 1.0;
    }
    data
}

#[test]
fn two_blocks_split_at_beat_ten() {
    let data = two_block_matrix();
    let affinity = local_affinity(&data, None, 1, Metric::Cosine).unwrap();
    let enhanced = enhance_diagonals(&affinity, 7).unwrap();
    // The graph has one connected component per block, so the informative
    // eigenvectors are the leading ones.
    let config = EmbedConfig {
        smooth_window: 9,
        skip: 0,
        cumulative_norm: false,
    };
    let embedding = embed(&enhanced, 2, &config).unwrap();
    let labels = kmeans(&embedding, 2, &KMeansConfig::default()).unwrap();

    assert_eq!(boundary_beats(&labels), vec![0, 10]);
    assert!(labels[..10].iter().all(|&l| l == labels[0]));
    assert!(labels[10..].iter().all(|&l| l == labels[10]));
    assert_ne!(labels[0], labels[10]);
}

#[test]
fn two_block_track_end_to_end() {
    let features = synthetic_track(&[(0, 10), (5, 10)], 5);
    let result = Segmenter::new()
        .with_k(2)
        .with_embed_skip(0)
        .segment(&features)
        .unwrap();

    assert_eq!(result.segments.len(), 2);
    assert_eq!(result.segments[0].start, 0.0);
    // The boundary falls on beat 10, i.e. frame 50.
    let expected = (50 * 512) as f32 / 22050.0;
    assert!((result.segments[1].start - expected).abs() < 1e-5);
    assert_ne!(result.segments[0].label, result.segments[1].label);
}

#[test]
fn k_one_yields_a_single_full_track_segment() {
    let features = synthetic_track(&[(0, 8), (4, 8), (9, 8)], 4);
    let result = Segmenter::new().with_k(1).segment(&features).unwrap();

    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].start, 0.0);
    assert!((result.segments[0].end - features.duration()).abs() < 1e-5);
}

#[test]
fn segments_cover_the_track_in_order() {
    let features = synthetic_track(&[(0, 12), (5, 12), (0, 12), (7, 12)], 4);
    let result = Segmenter::new()
        .with_k(3)
        .with_embed_skip(0)
        .segment(&features)
        .unwrap();

    assert!(result.segments.len() <= result.labels.len());
    assert_eq!(result.segments[0].start, 0.0);
    for pair in result.segments.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
        assert!(pair[0].label != pair[1].label);
    }
    let total: f32 = result.segments.iter().map(|s| s.duration()).sum();
    assert!((total - features.duration()).abs() < 1e-4);
}

#[test]
fn identical_seeds_give_identical_output() {
    let features = synthetic_track(&[(0, 10), (3, 10), (6, 10), (9, 10)], 4);
    let segmenter = Segmenter::new().with_k(4).with_embed_skip(0).with_seed(13);
    let first = segmenter.segment(&features).unwrap();
    let second = segmenter.segment(&features).unwrap();

    assert_eq!(first.labels, second.labels);
    assert_eq!(first.segments, second.segments);
}

#[test]
fn degenerate_beat_list_collapses_to_four_columns() {
    let features = synthetic_track(&[(0, 5)], 5);
    // 25 frames; 5 == 5 collapses, leaving boundaries 0/5/12/20/25.
    let bounds = fix_beats(&[0, 5, 5, 12, 20], features.n_frames).unwrap();
    assert_eq!(bounds.len(), 5);
    let synced = beat_sync(&features.chroma, &[0, 5, 5, 12, 20], Aggregate::Mean).unwrap();
    assert_eq!(synced.shape()[1], 4);
}

#[test]
fn recurrence_artifact_matches_beat_count() {
    let features = synthetic_track(&[(0, 9), (5, 9)], 4);
    let result = Segmenter::new()
        .with_k(2)
        .with_embed_skip(0)
        .segment(&features)
        .unwrap();
    let n_beats = result.labels.len();
    assert_eq!(result.recurrence.shape(), &[n_beats, n_beats]);
    assert_eq!(result.beat_bounds.len(), n_beats + 1);
    for value in result.recurrence.iter() {
        assert!(*value == 0.0 || *value == 1.0);
    }
}

#[test]
fn mfcc_feature_path_runs() {
    let features = synthetic_track(&[(0, 10), (8, 10)], 4);
    let result = Segmenter::new()
        .with_k(2)
        .with_embed_skip(0)
        .with_feature(refrain::FeatureKind::Mfcc)
        .segment(&features)
        .unwrap();
    assert_eq!(result.labels.len(), 20);
}
