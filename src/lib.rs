//! # Chroma Enhance
//!
//! Post-processing for harmonic pitch class profiles (HPCP / chromagrams).
//! Takes a raw 12 x N pitch-class energy matrix produced by an external
//! extractor and emphasizes its salient harmonic content.
//!
//! ## Pipeline
//!
//! 1. **Global normalization**: divide by the global maximum
//! 2. **Log compression**: `ln(1000 x + 1)`
//! 3. **Global threshold**: zero entries below `0.2 ln(1001)`
//! 4. **Frame normalization**: scale each frame to a maximum of 1, silence weak frames
//! 5. **Neighbor filtering**: keep only energy corroborated by similar frames
//! 6. **Temporal smoothing**: 9-frame median along time
//!
//! ## Quick Start
//!
//! ```
//! use chroma_enhance::{enhance, ChromaMatrix};
//!
//! // 12 pitch-class rows, one column per frame
//! let mut rows = vec![vec![0.0f32; 4]; 12];
//! rows[0] = vec![1.0, 0.9, 1.0, 0.8]; // C
//! rows[7] = vec![0.6, 0.7, 0.5, 0.6]; // G
//!
//! let chroma = ChromaMatrix::from_rows(&rows)?;
//! let enhanced = enhance(&chroma)?;
//! assert_eq!(enhanced.num_frames(), 4);
//! # Ok::<(), chroma_enhance::ChromaError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod chroma;
pub mod config;
pub mod error;
pub mod io;

use std::time::Instant;

use rayon::prelude::*;

use crate::chroma::neighbors::{nearest_neighbor_filter, suppress_unsupported};
use crate::chroma::normalization::{
    apply_threshold, log_compress, normalize_frames, normalize_global,
};
use crate::chroma::smoothing::median_filter_frames;

// Re-export main types
pub use analysis::result::{EnhancementMetadata, EnhancementResult};
pub use chroma::matrix::{ChromaMatrix, PitchClass, NUM_PITCH_CLASSES};
pub use chroma::neighbors::{Aggregate, NeighborFilterConfig};
pub use chroma::smoothing::BoundaryMode;
pub use config::EnhanceConfig;
pub use error::ChromaError;

/// Enhance a chromagram with the default configuration
///
/// # Errors
///
/// Returns `ChromaError::DegenerateInputError` if every entry is zero.
///
/// # Example
///
/// ```
/// use chroma_enhance::{enhance, ChromaMatrix};
///
/// let mut frame = [0.0f32; 12];
/// frame[0] = 1.0;
/// let enhanced = enhance(&ChromaMatrix::new(vec![frame])?)?;
/// assert_eq!(enhanced.frame(0), &frame);
/// # Ok::<(), chroma_enhance::ChromaError>(())
/// ```
pub fn enhance(chroma: &ChromaMatrix) -> Result<ChromaMatrix, ChromaError> {
    enhance_chroma(chroma, &EnhanceConfig::default()).map(|result| result.chroma)
}

/// Main enhancement function
///
/// Runs the full pipeline and returns the enhanced matrix together with
/// per-run statistics. The input is not modified.
///
/// # Arguments
///
/// * `chroma` - Raw chroma matrix (non-negative energies)
/// * `config` - Enhancement parameters
///
/// # Returns
///
/// `EnhancementResult` containing a matrix with the same number of frames
///
/// # Errors
///
/// - `InvalidInput` if `config` fails validation
/// - `DegenerateInputError` if the global maximum is zero
pub fn enhance_chroma(
    chroma: &ChromaMatrix,
    config: &EnhanceConfig,
) -> Result<EnhancementResult, ChromaError> {
    let start_time = Instant::now();
    config.validate()?;

    log::debug!("Starting chroma enhancement: {} frames", chroma.num_frames());

    let mut work = chroma.clone();

    // Stages 1-4: scale, compress, threshold
    let global_max = normalize_global(&mut work)?;
    log_compress(&mut work, config.compression_factor);
    let thresholded_entries = apply_threshold(&mut work, config.global_threshold());
    let silent_frames = normalize_frames(&mut work, config.frame_threshold());

    log::debug!(
        "Normalized: global max {:.6}, {} entries below global threshold, {} silent frames",
        global_max,
        thresholded_entries,
        silent_frames
    );

    // Stage 5: neighbor filtering
    let mut neighbor_count = None;
    if let Some(nn_config) = &config.neighbor_filter {
        neighbor_count = nn_config.neighbor_count(work.num_frames());
        if neighbor_count.is_some() {
            let filtered = nearest_neighbor_filter(&work, nn_config);
            work = suppress_unsupported(&work, &filtered)?;
        }
    }

    // Stage 6: temporal smoothing
    let enhanced = median_filter_frames(&work, config.median_window, config.median_boundary);

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
    log::debug!("Chroma enhancement finished in {:.2} ms", processing_time_ms);

    Ok(EnhancementResult {
        metadata: EnhancementMetadata {
            num_frames: enhanced.num_frames(),
            global_max,
            thresholded_entries,
            silent_frames,
            neighbor_count,
            processing_time_ms,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        chroma: enhanced,
    })
}

/// Validate a raw row table and enhance it
///
/// # Arguments
///
/// * `rows` - 12 pitch-class rows, each with one value per frame
/// * `config` - Enhancement parameters
///
/// # Errors
///
/// - `DimensionError` if the table is not 12 rows of equal, non-zero length
/// - `InvalidInput` for negative or non-finite entries
/// - any error from [`enhance_chroma`]
pub fn enhance_rows<R: AsRef<[f32]>>(
    rows: &[R],
    config: &EnhanceConfig,
) -> Result<EnhancementResult, ChromaError> {
    let chroma = ChromaMatrix::from_rows(rows)?;
    enhance_chroma(&chroma, config)
}

/// Enhance independent chromagrams in parallel
///
/// Each matrix is processed on its own; results are returned in input order,
/// one per input, so a failing matrix does not affect the others.
pub fn enhance_batch(
    chromas: &[ChromaMatrix],
    config: &EnhanceConfig,
) -> Vec<Result<EnhancementResult, ChromaError>> {
    log::debug!("Enhancing batch of {} chromagrams", chromas.len());
    chromas
        .par_iter()
        .map(|chroma| enhance_chroma(chroma, config))
        .collect()
}
