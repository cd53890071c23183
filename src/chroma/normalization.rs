//! Chroma normalization, log compression and thresholding
//!
//! These are the first four enhancement stages. They operate in place and
//! must run in order: the thresholds are expressed relative to the value a
//! fully saturated entry takes after log compression, which only holds once
//! the matrix has been scaled to [0, 1].

use crate::chroma::matrix::ChromaMatrix;
use crate::error::ChromaError;

/// Divide every entry by the global maximum
///
/// # Returns
///
/// The global maximum before scaling
///
/// # Errors
///
/// Returns `DegenerateInputError` if the maximum is zero (all-silent input).
pub fn normalize_global(chroma: &mut ChromaMatrix) -> Result<f32, ChromaError> {
    let max = chroma.max_value();
    if max <= 0.0 {
        return Err(ChromaError::DegenerateInputError(format!(
            "Global maximum is {} across {} frames, cannot normalize",
            max,
            chroma.num_frames()
        )));
    }

    for v in chroma.values_mut() {
        *v /= max;
    }

    Ok(max)
}

/// Replace each entry `x` with `ln(factor * x + 1)`
///
/// Maps 0 to 0 and 1 to `ln(factor + 1)`.
pub fn log_compress(chroma: &mut ChromaMatrix, factor: f32) {
    for v in chroma.values_mut() {
        *v = (factor * *v).ln_1p();
    }
}

/// Zero out every entry strictly below `threshold`
///
/// # Returns
///
/// Number of non-zero entries that were zeroed
pub fn apply_threshold(chroma: &mut ChromaMatrix, threshold: f32) -> usize {
    let mut zeroed = 0;
    for v in chroma.values_mut() {
        if *v < threshold {
            if *v != 0.0 {
                zeroed += 1;
            }
            *v = 0.0;
        }
    }
    zeroed
}

/// Scale every frame so its strongest pitch class is 1
///
/// Frames whose maximum is below `threshold` carry no salient pitch
/// content and are set entirely to zero.
///
/// # Returns
///
/// Number of frames treated as silent
pub fn normalize_frames(chroma: &mut ChromaMatrix, threshold: f32) -> usize {
    let mut silent = 0;
    for frame in chroma.frames_mut() {
        let frame_max = frame.iter().copied().fold(0.0f32, f32::max);
        if frame_max < threshold || frame_max <= 0.0 {
            frame.fill(0.0);
            silent += 1;
        } else {
            for v in frame.iter_mut() {
                *v /= frame_max;
            }
        }
    }

    log::debug!(
        "Frame normalization: {} of {} frames below threshold {:.4}",
        silent,
        chroma.num_frames(),
        threshold
    );

    silent
}
