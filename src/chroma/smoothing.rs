//! Temporal chroma smoothing

use serde::{Deserialize, Serialize};

use crate::chroma::matrix::{ChromaMatrix, NUM_PITCH_CLASSES};

/// How the median window is handled at the first and last frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryMode {
    /// Mirror the matrix about its edges (`d c b a | a b c d | d c b a`)
    Reflect,
    /// Clip the window to the available frames
    Truncate,
}

/// Smooth each pitch class over time with a median filter
///
/// The window for frame `i` spans `i - window / 2 ..= i - window / 2 + window - 1`
/// and the output is the element of rank `window / 2` in the sorted window.
///
/// # Arguments
///
/// * `chroma` - Chroma matrix
/// * `window` - Window length in frames (e.g., 9); 0 and 1 return the input unchanged
/// * `boundary` - Edge handling
///
/// # Returns
///
/// Smoothed chroma matrix
pub fn median_filter_frames(
    chroma: &ChromaMatrix,
    window: usize,
    boundary: BoundaryMode,
) -> ChromaMatrix {
    log::debug!(
        "Smoothing {} chroma frames with median window {} ({:?})",
        chroma.num_frames(),
        window,
        boundary
    );

    if window <= 1 {
        return chroma.clone();
    }

    let n = chroma.num_frames();
    let before = (window / 2) as isize;
    let frames = chroma.frames();
    let mut out = chroma.clone();
    let mut scratch: Vec<f32> = Vec::with_capacity(window);

    for (i, target) in out.frames_mut().iter_mut().enumerate() {
        let start = i as isize - before;
        let end = start + window as isize;
        for pitch in 0..NUM_PITCH_CLASSES {
            scratch.clear();
            match boundary {
                BoundaryMode::Reflect => {
                    scratch.extend((start..end).map(|idx| frames[reflect_index(idx, n)][pitch]));
                }
                BoundaryMode::Truncate => {
                    let lo = start.max(0) as usize;
                    let hi = (end as usize).min(n);
                    scratch.extend(frames[lo..hi].iter().map(|f| f[pitch]));
                }
            }
            scratch.sort_unstable_by(f32::total_cmp);
            target[pitch] = scratch[scratch.len() / 2];
        }
    }

    out
}

/// Map an out-of-range index back into `0..len` by mirroring at the edges
fn reflect_index(idx: isize, len: usize) -> usize {
    let n = len as isize;
    let m = idx.rem_euclid(2 * n);
    if m < n {
        m as usize
    } else {
        (2 * n - 1 - m) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pitch(values: &[f32]) -> ChromaMatrix {
        let frames = values
            .iter()
            .map(|&v| {
                let mut f = [0.0f32; NUM_PITCH_CLASSES];
                f[0] = v;
                f
            })
            .collect();
        ChromaMatrix::new(frames).unwrap()
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(-5, 4), 3);
        assert_eq!(reflect_index(9, 4), 1);
        assert_eq!(reflect_index(-4, 1), 0);
    }

    #[test]
    fn test_single_frame_unchanged() {
        let chroma = single_pitch(&[0.7]);
        let out = median_filter_frames(&chroma, 9, BoundaryMode::Reflect);
        assert_eq!(out, chroma);
    }

    #[test]
    fn test_removes_short_spike() {
        let chroma = single_pitch(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let out = median_filter_frames(&chroma, 9, BoundaryMode::Reflect);
        assert!(out.row(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fills_short_gap() {
        let chroma = single_pitch(&[1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let out = median_filter_frames(&chroma, 9, BoundaryMode::Reflect);
        assert!(out.row(0).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_reflect_boundary() {
        // Frame 0 window with reflect: [3,2,1,0 | 0,1,2,3,4] -> values 4,3,2,1,1,2,3,4,5
        let chroma = single_pitch(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let out = median_filter_frames(&chroma, 9, BoundaryMode::Reflect);
        assert_eq!(out.get(0, 0), 3.0);
        assert_eq!(out.get(0, 4), 5.0);
        assert_eq!(out.get(0, 8), 7.0);
    }

    #[test]
    fn test_truncate_boundary() {
        // Frame 0 window clipped to frames 0..=4 -> median 3
        let chroma = single_pitch(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let out = median_filter_frames(&chroma, 9, BoundaryMode::Truncate);
        assert_eq!(out.get(0, 0), 3.0);
        assert_eq!(out.get(0, 4), 5.0);
        // Frame 8 window clipped to frames 4..=8 -> median 7
        assert_eq!(out.get(0, 8), 7.0);
    }

    #[test]
    fn test_window_one_is_identity() {
        let chroma = single_pitch(&[0.3, 0.9, 0.1]);
        let out = median_filter_frames(&chroma, 1, BoundaryMode::Reflect);
        assert_eq!(out, chroma);
    }
}
