//! Nearest-neighbor chroma filtering
//!
//! Each frame is replaced by an aggregate of the frames whose pitch-class
//! vectors are closest to it in cosine distance. Combined with an elementwise
//! minimum against the input ([`suppress_unsupported`]) this keeps only the
//! energy that recurs elsewhere in the piece and drops one-off activations.
//!
//! Neighbor selection:
//! - candidates are all frames `j` with `|i - j| >= width`
//! - candidates are ranked by cosine distance, ties broken by lower frame index
//! - the first `k` are kept, `k = 2 * ceil(sqrt(n - 2 * width + 1))` by default
//! - a zero vector has distance 1 to every vector

use serde::{Deserialize, Serialize};

use crate::chroma::matrix::{ChromaMatrix, NUM_PITCH_CLASSES};
use crate::error::ChromaError;

/// How neighbor values are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregate {
    /// Per-pitch-class median (even counts average the two middle values)
    Median,
    /// Per-pitch-class mean
    Mean,
}

/// Nearest-neighbor filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborFilterConfig {
    /// Neighbors per frame (default: None = `2 * ceil(sqrt(n - 2 * width + 1))`)
    pub k: Option<usize>,

    /// Frames closer than this in time are never neighbors (default: 1, only the frame itself)
    pub width: usize,

    /// Aggregation across neighbors (default: Median)
    pub aggregate: Aggregate,
}

impl Default for NeighborFilterConfig {
    fn default() -> Self {
        Self {
            k: None,
            width: 1,
            aggregate: Aggregate::Median,
        }
    }
}

impl NeighborFilterConfig {
    /// Check parameters
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for `width == 0` or `k == Some(0)`.
    pub fn validate(&self) -> Result<(), ChromaError> {
        if self.width == 0 {
            return Err(ChromaError::InvalidInput(
                "neighbor width must be at least 1".to_string(),
            ));
        }
        if self.k == Some(0) {
            return Err(ChromaError::InvalidInput(
                "neighbor count k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Neighbor count for a matrix of `num_frames` frames
    ///
    /// Returns `None` when the matrix is too short for any frame to have a
    /// neighbor outside the exclusion band (`num_frames < 2 * width + 1`).
    /// Recurrence-matrix implementations commonly refuse `width >= (n - 1) / 2`
    /// (fewer than 5 frames at width 1); here 3 and 4 frames are filtered too.
    pub fn neighbor_count(&self, num_frames: usize) -> Option<usize> {
        if num_frames < 2 * self.width + 1 {
            return None;
        }
        let k = self.k.unwrap_or_else(|| {
            let span = (num_frames - 2 * self.width + 1) as f64;
            2 * span.sqrt().ceil() as usize
        });
        Some(k.min(num_frames - 1))
    }
}

/// Cosine distance between two pitch-class vectors, clamped to [0, 2]
///
/// A zero vector has distance 1 to everything, including another zero vector.
pub fn cosine_distance(a: &[f32; NUM_PITCH_CLASSES], b: &[f32; NUM_PITCH_CLASSES]) -> f32 {
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0)
}

/// Aggregate each frame's nearest neighbors
///
/// # Arguments
///
/// * `chroma` - Frame-normalized chroma matrix
/// * `config` - Neighbor selection and aggregation parameters
///
/// # Returns
///
/// Filtered matrix (same size). The input is returned unchanged when the
/// matrix is too short to have neighbors.
pub fn nearest_neighbor_filter(
    chroma: &ChromaMatrix,
    config: &NeighborFilterConfig,
) -> ChromaMatrix {
    let n = chroma.num_frames();
    let Some(k) = config.neighbor_count(n) else {
        log::debug!(
            "Skipping neighbor filter: {} frames, exclusion width {}",
            n,
            config.width
        );
        return chroma.clone();
    };

    log::debug!("Neighbor filter: {} frames, k={}, width={}", n, k, config.width);

    let frames = chroma.frames();
    let mut out = chroma.clone();
    let mut candidates: Vec<(f32, usize)> = Vec::with_capacity(n);
    let mut scratch: Vec<f32> = Vec::with_capacity(k);

    for (i, target) in out.frames_mut().iter_mut().enumerate() {
        candidates.clear();
        candidates.extend(
            frames
                .iter()
                .enumerate()
                .filter(|(j, _)| i.abs_diff(*j) >= config.width)
                .map(|(j, f)| (cosine_distance(&frames[i], f), j)),
        );
        if candidates.is_empty() {
            continue;
        }

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        candidates.truncate(k);

        for pitch in 0..NUM_PITCH_CLASSES {
            scratch.clear();
            scratch.extend(candidates.iter().map(|&(_, j)| frames[j][pitch]));
            target[pitch] = match config.aggregate {
                Aggregate::Median => median(&mut scratch),
                Aggregate::Mean => scratch.iter().sum::<f32>() / scratch.len() as f32,
            };
        }
    }

    out
}

/// Keep only energy that the neighbor aggregate corroborates
///
/// Elementwise minimum of the frame-normalized matrix and its filtered version.
///
/// # Errors
///
/// Returns `DimensionError` if the matrices differ in frame count.
pub fn suppress_unsupported(
    chroma: &ChromaMatrix,
    filtered: &ChromaMatrix,
) -> Result<ChromaMatrix, ChromaError> {
    chroma.min_with(filtered)
}

/// Median of a non-empty slice; sorts in place
fn median(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(entries: &[(usize, f32)]) -> [f32; NUM_PITCH_CLASSES] {
        let mut frame = [0.0f32; NUM_PITCH_CLASSES];
        for &(pitch, v) in entries {
            frame[pitch] = v;
        }
        frame
    }

    #[test]
    fn test_default_neighbor_count() {
        let config = NeighborFilterConfig::default();
        assert_eq!(config.neighbor_count(1), None);
        assert_eq!(config.neighbor_count(2), None);
        // n=3: 2 * ceil(sqrt(2)) = 4, capped at n - 1
        assert_eq!(config.neighbor_count(3), Some(2));
        // n=4: 2 * ceil(sqrt(3)) = 4, capped at n - 1
        assert_eq!(config.neighbor_count(4), Some(3));
        // n=11: 2 * ceil(sqrt(10)) = 8
        assert_eq!(config.neighbor_count(11), Some(8));
        // n=40: 2 * ceil(sqrt(39)) = 14
        assert_eq!(config.neighbor_count(40), Some(14));

        let fixed = NeighborFilterConfig {
            k: Some(3),
            ..NeighborFilterConfig::default()
        };
        assert_eq!(fixed.neighbor_count(40), Some(3));
    }

    #[test]
    fn test_cosine_distance() {
        let a = frame_with(&[(0, 1.0)]);
        let b = frame_with(&[(0, 2.0)]);
        let c = frame_with(&[(1, 1.0)]);
        let zero = [0.0f32; NUM_PITCH_CLASSES];

        assert!(cosine_distance(&a, &b).abs() < 1e-6);
        assert!((cosine_distance(&a, &c) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&a, &zero), 1.0);
        assert_eq!(cosine_distance(&zero, &zero), 1.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_single_frame_is_identity() {
        let chroma = ChromaMatrix::new(vec![frame_with(&[(0, 1.0)])]).unwrap();
        let filtered = nearest_neighbor_filter(&chroma, &NeighborFilterConfig::default());
        assert_eq!(filtered, chroma);
    }

    #[test]
    fn test_transient_is_suppressed() {
        // Sustained C with one frame adding a stray F#
        let c = frame_with(&[(0, 1.0)]);
        let mut frames = vec![c; 10];
        frames[4] = frame_with(&[(0, 1.0), (6, 0.9)]);
        let chroma = ChromaMatrix::new(frames).unwrap();

        let filtered = nearest_neighbor_filter(&chroma, &NeighborFilterConfig::default());
        let kept = suppress_unsupported(&chroma, &filtered).unwrap();

        assert_eq!(kept.get(6, 4), 0.0);
        assert_eq!(kept.get(0, 4), 1.0);
        for i in 0..10 {
            assert_eq!(kept.get(0, i), 1.0);
        }
    }

    #[test]
    fn test_mean_aggregate() {
        let frames = vec![
            frame_with(&[(0, 1.0)]),
            frame_with(&[(0, 0.5)]),
            frame_with(&[(0, 0.25)]),
        ];
        let chroma = ChromaMatrix::new(frames).unwrap();
        let config = NeighborFilterConfig {
            aggregate: Aggregate::Mean,
            ..NeighborFilterConfig::default()
        };
        let filtered = nearest_neighbor_filter(&chroma, &config);

        // k = 2, every frame averages the other two
        assert!((filtered.get(0, 0) - 0.375).abs() < 1e-6);
        assert!((filtered.get(0, 1) - 0.625).abs() < 1e-6);
        assert!((filtered.get(0, 2) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_width_excludes_adjacent_frames() {
        // With width 2, frame 0 may not use frame 1
        let frames = vec![
            frame_with(&[(0, 1.0)]),
            frame_with(&[(0, 1.0)]),
            frame_with(&[(1, 1.0)]),
            frame_with(&[(1, 1.0)]),
            frame_with(&[(1, 1.0)]),
        ];
        let chroma = ChromaMatrix::new(frames).unwrap();
        let config = NeighborFilterConfig {
            k: Some(1),
            width: 2,
            aggregate: Aggregate::Median,
        };
        let filtered = nearest_neighbor_filter(&chroma, &config);

        // All eligible frames for frame 0 are at distance 1; lowest index (2) wins
        assert_eq!(filtered.frame(0), chroma.frame(2));
        // Frame 4 can use frames 0..=2; frame 2 is identical
        assert_eq!(filtered.frame(4), chroma.frame(2));
    }
}
