//! Enhancement result types

use serde::{Deserialize, Serialize};

use crate::chroma::matrix::{dominant, ChromaMatrix, PitchClass};

/// Enhanced chromagram with run statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementResult {
    /// Enhanced chroma matrix (same size as the input)
    pub chroma: ChromaMatrix,

    /// Enhancement metadata
    pub metadata: EnhancementMetadata,
}

impl EnhancementResult {
    /// Strongest pitch class of the enhanced mean profile
    ///
    /// `None` when every frame ended up silent.
    pub fn dominant_pitch_class(&self) -> Option<PitchClass> {
        dominant(&self.chroma.mean_profile())
    }
}

/// Enhancement metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementMetadata {
    /// Number of frames processed
    pub num_frames: usize,

    /// Global maximum of the raw input
    pub global_max: f32,

    /// Entries zeroed by the global threshold
    pub thresholded_entries: usize,

    /// Frames treated as silent by the per-frame threshold
    pub silent_frames: usize,

    /// Neighbors aggregated per frame (None if the neighbor filter did not run)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbor_count: Option<usize>,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,
}
