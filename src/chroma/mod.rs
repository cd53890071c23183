//! Chroma matrix model and enhancement stages
//!
//! Operates on already-extracted pitch-class profiles (12 semitones x frames):
//! - Matrix model and pitch-class labels
//! - Normalization, log compression and thresholding
//! - Nearest-neighbor filtering
//! - Temporal smoothing

pub mod matrix;
pub mod neighbors;
pub mod normalization;
pub mod smoothing;
