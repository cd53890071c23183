//! Configuration parameters for chroma enhancement

use serde::{Deserialize, Serialize};

use crate::chroma::neighbors::NeighborFilterConfig;
use crate::chroma::smoothing::BoundaryMode;
use crate::error::ChromaError;

/// Enhancement configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    // Log compression
    /// Compression factor `C` in `ln(C * x + 1)` (default: 1000.0)
    pub compression_factor: f32,

    // Thresholds
    /// Global threshold as a fraction of `ln(C + 1)` (default: 0.2)
    /// Entries below it are zeroed after log compression
    pub global_threshold_ratio: f32,

    /// Per-frame threshold as a fraction of `ln(C + 1)` (default: 0.2)
    /// Frames whose maximum falls below it are treated as silent
    pub frame_threshold_ratio: f32,

    // Neighbor filtering
    /// Nearest-neighbor filter settings (default: enabled, cosine, median)
    /// `None` skips the stage entirely
    pub neighbor_filter: Option<NeighborFilterConfig>,

    // Temporal smoothing
    /// Median filter window along the frame axis (default: 9)
    /// A window of 1 leaves the matrix unchanged
    pub median_window: usize,

    /// How the median window is extended past the first and last frame (default: Reflect)
    pub median_boundary: BoundaryMode,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            compression_factor: 1000.0,
            global_threshold_ratio: 0.2,
            frame_threshold_ratio: 0.2,
            neighbor_filter: Some(NeighborFilterConfig::default()),
            median_window: 9,
            median_boundary: BoundaryMode::Reflect,
        }
    }
}

impl EnhanceConfig {
    /// Normalization and thresholding followed by a wide clipped median only
    ///
    /// Matches the post-processing built into the native HPCP extractor:
    /// no neighbor filtering and a 33-frame median window that is clipped
    /// at the matrix edges instead of reflected.
    pub fn median_only() -> Self {
        Self {
            neighbor_filter: None,
            median_window: 33,
            median_boundary: BoundaryMode::Truncate,
            ..Self::default()
        }
    }

    /// Value of a fully saturated entry after log compression, `ln(C + 1)`
    pub fn compression_ceiling(&self) -> f32 {
        self.compression_factor.ln_1p()
    }

    /// Threshold applied to every entry after log compression
    pub fn global_threshold(&self) -> f32 {
        self.global_threshold_ratio * self.compression_ceiling()
    }

    /// Threshold applied to each frame maximum
    pub fn frame_threshold(&self) -> f32 {
        self.frame_threshold_ratio * self.compression_ceiling()
    }

    /// Check that all parameters are usable
    ///
    /// # Errors
    ///
    /// Returns `ChromaError::InvalidInput` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ChromaError> {
        if !self.compression_factor.is_finite() || self.compression_factor <= 0.0 {
            return Err(ChromaError::InvalidInput(format!(
                "compression_factor must be positive and finite, got {}",
                self.compression_factor
            )));
        }

        for (name, ratio) in [
            ("global_threshold_ratio", self.global_threshold_ratio),
            ("frame_threshold_ratio", self.frame_threshold_ratio),
        ] {
            if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
                return Err(ChromaError::InvalidInput(format!(
                    "{} must be within [0, 1], got {}",
                    name, ratio
                )));
            }
        }

        if self.median_window == 0 {
            return Err(ChromaError::InvalidInput(
                "median_window must be at least 1".to_string(),
            ));
        }

        if let Some(nn) = &self.neighbor_filter {
            nn.validate()?;
        }

        Ok(())
    }
}
