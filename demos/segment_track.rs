//! Structure Segmentation Example
//!
//! This example builds a synthetic track with a verse/chorus layout,
//! runs the spectral segmentation pipeline on it, and prints the
//! recovered section list alongside an agglomerative boundary estimate.
//!
//! Real applications implement `FeatureSource` on top of an audio
//! front end (CQT/chroma, MFCC, beat tracker) instead of synthesizing
//! the features.

use std::path::Path;

use log::info;
use ndarray::Array2;
use refrain::cluster::agglomerative;
use refrain::{FeatureSource, Segmenter, TrackFeatures};

/// Section layout of the synthetic track: (name, chroma root, beats).
const LAYOUT: &[(&str, usize, usize)] = &[
    ("intro", 9, 8),
    ("verse", 0, 16),
    ("chorus", 5, 16),
    ("verse", 0, 16),
    ("chorus", 5, 16),
    ("outro", 9, 8),
];

const FRAMES_PER_BEAT: usize = 4;

/// A front end that ignores the path and fabricates features for the
/// fixed layout above.
struct SyntheticSource;

impl FeatureSource for SyntheticSource {
    fn load_features(&self, _path: &Path) -> refrain::Result<TrackFeatures> {
        let n_beats: usize = LAYOUT.iter().map(|&(_, _, beats)| beats).sum();
        let n_frames = n_beats * FRAMES_PER_BEAT;
        let mut chroma = Array2::<f32>::zeros((12, n_frames));
        let mut mfcc = Array2::<f32>::zeros((20, n_frames));

        let mut t = 0;
        for &(_, root, beats) in LAYOUT {
            for _ in 0..beats * FRAMES_PER_BEAT {
                // A root-fifth-third profile with a little deterministic
                // wobble so beats inside a section are similar, not equal.
                let wobble = 0.08 * (t as f32 * 0.37).sin();
                chroma[(root % 12, t)] = 1.0 + wobble;
                chroma[((root + 7) % 12, t)] = 0.6 - wobble;
                chroma[((root + 4) % 12, t)] = 0.4;
                mfcc[(root % 20, t)] = 1.0 + wobble;
                mfcc[((root + 3) % 20, t)] = 0.5;
                t += 1;
            }
        }

        Ok(TrackFeatures {
            sample_rate: 22050,
            hop_length: 512,
            n_frames,
            beat_frames: (0..n_frames).step_by(FRAMES_PER_BEAT).collect(),
            chroma,
            mfcc,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    info!("Structure Segmentation");

    let features = SyntheticSource.load_features(Path::new("synthetic"))?;
    info!(
        "Track: {} frames, {} beats, {:.1}s",
        features.n_frames,
        features.beat_frames.len(),
        features.duration()
    );

    // Three section types in the layout: verse, chorus, intro/outro.
    let segmenter = Segmenter::new()
        .with_k(3)
        .with_embed_skip(0)
        .with_seed(1);
    let result = segmenter.segment(&features)?;

    info!(
        "Embedding: {} components x {} beats",
        result.embedding.shape()[0],
        result.embedding.shape()[1]
    );
    let edges = result.recurrence.iter().filter(|&&v| v > 0.0).count() / 2;
    info!("Recurrence graph: {} undirected edges", edges);

    println!("segments ({}):", result.segments.len());
    println!("{:>10} {:>10} {:>7}", "start", "end", "label");
    for segment in &result.segments {
        println!(
            "{:>9.2}s {:>9.2}s {:>7}",
            segment.start, segment.end, segment.label
        );
    }

    // Boundary-only comparison, as a sanity check on the spectral result.
    let synced = refrain::sync::beat_sync(
        &features.chroma,
        &features.beat_frames,
        refrain::sync::Aggregate::Mean,
    )?;
    let bounds = agglomerative(&synced, result.segments.len());
    let times: Vec<f32> = bounds
        .iter()
        .map(|&beat| {
            refrain::convert::frame_to_time(
                result.beat_bounds[beat],
                features.sample_rate,
                features.hop_length,
            )
        })
        .collect();
    println!("agglomerative boundaries: {times:.1?}");

    Ok(())
}
