//! Chroma matrix data model
//!
//! A chromagram is 12 pitch-class rows (C, C#, ..., B) by N time-ordered
//! frames. Storage is frame-major, one `[f32; 12]` per frame, which keeps
//! the per-frame operations (column normalization, cosine similarity)
//! contiguous. The row-major view used by delimited tables is available
//! through [`ChromaMatrix::from_rows`] and [`ChromaMatrix::to_rows`].

use serde::{Deserialize, Serialize};

use crate::error::ChromaError;

/// Number of pitch classes (semitones per octave)
pub const NUM_PITCH_CLASSES: usize = 12;

/// Pitch class, semitone-ordered starting at C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in row order
    pub const ALL: [PitchClass; NUM_PITCH_CLASSES] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Pitch class for a row index (wraps modulo 12)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % NUM_PITCH_CLASSES]
    }

    /// Row index (0 = C, 11 = B)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Note name in sharp notation (e.g., "C", "F#")
    ///
    /// # Example
    ///
    /// ```
    /// use chroma_enhance::PitchClass;
    ///
    /// assert_eq!(PitchClass::C.name(), "C");
    /// assert_eq!(PitchClass::FSharp.name(), "F#");
    /// assert_eq!(PitchClass::from_index(21).name(), "A");
    /// ```
    pub fn name(self) -> &'static str {
        const NAMES: [&str; NUM_PITCH_CLASSES] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        NAMES[self.index()]
    }
}

/// Pitch-class by frame energy matrix
///
/// Deserialization goes through [`ChromaMatrix::new`], so a decoded matrix
/// satisfies the same shape and value checks as a constructed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChromaMatrix")]
pub struct ChromaMatrix {
    frames: Vec<[f32; NUM_PITCH_CLASSES]>,
}

/// Unvalidated serialized form of [`ChromaMatrix`]
#[derive(Deserialize)]
struct RawChromaMatrix {
    frames: Vec<[f32; NUM_PITCH_CLASSES]>,
}

impl TryFrom<RawChromaMatrix> for ChromaMatrix {
    type Error = ChromaError;

    fn try_from(raw: RawChromaMatrix) -> Result<Self, Self::Error> {
        ChromaMatrix::new(raw.frames)
    }
}

impl ChromaMatrix {
    /// Build a matrix from frame-major data
    ///
    /// # Errors
    ///
    /// - `DimensionError` if `frames` is empty
    /// - `InvalidInput` if any entry is negative or not finite
    pub fn new(frames: Vec<[f32; NUM_PITCH_CLASSES]>) -> Result<Self, ChromaError> {
        if frames.is_empty() {
            return Err(ChromaError::DimensionError(
                "Chroma matrix has no frames".to_string(),
            ));
        }

        for (frame_idx, frame) in frames.iter().enumerate() {
            for (pitch, &value) in frame.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ChromaError::InvalidInput(format!(
                        "Entry ({}, frame {}) must be finite and non-negative, got {}",
                        PitchClass::from_index(pitch).name(),
                        frame_idx,
                        value
                    )));
                }
            }
        }

        Ok(Self { frames })
    }

    /// Build a matrix from pitch-class rows (12 rows, one column per frame)
    ///
    /// # Errors
    ///
    /// - `DimensionError` if there are not exactly 12 rows, rows differ in
    ///   length, or there are no columns
    /// - `InvalidInput` if any entry is negative or not finite
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, ChromaError> {
        if rows.len() != NUM_PITCH_CLASSES {
            return Err(ChromaError::DimensionError(format!(
                "Expected {} pitch-class rows, got {}",
                NUM_PITCH_CLASSES,
                rows.len()
            )));
        }

        let rows: Vec<&[f32]> = rows.iter().map(|r| r.as_ref()).collect();
        let num_frames = rows[0].len();
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != num_frames)
        {
            return Err(ChromaError::DimensionError(format!(
                "Row {} has {} columns, expected {}",
                idx,
                row.len(),
                num_frames
            )));
        }

        let frames = (0..num_frames)
            .map(|frame_idx| {
                let mut frame = [0.0f32; NUM_PITCH_CLASSES];
                for (pitch, row) in rows.iter().enumerate() {
                    frame[pitch] = row[frame_idx];
                }
                frame
            })
            .collect();

        Self::new(frames)
    }

    /// Row-major copy (12 rows, one column per frame)
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        (0..NUM_PITCH_CLASSES).map(|pitch| self.row(pitch)).collect()
    }

    /// Number of frames (columns)
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Energies of one frame
    ///
    /// # Panics
    ///
    /// Panics if `frame_idx >= num_frames()`.
    pub fn frame(&self, frame_idx: usize) -> &[f32; NUM_PITCH_CLASSES] {
        &self.frames[frame_idx]
    }

    /// All frames in time order
    pub fn frames(&self) -> &[[f32; NUM_PITCH_CLASSES]] {
        &self.frames
    }

    /// Energy of one pitch class over time
    pub fn row(&self, pitch: usize) -> Vec<f32> {
        self.frames.iter().map(|frame| frame[pitch]).collect()
    }

    /// Single entry
    pub fn get(&self, pitch: usize, frame_idx: usize) -> f32 {
        self.frames[frame_idx][pitch]
    }

    /// Global maximum over all entries
    pub fn max_value(&self) -> f32 {
        self.values().fold(0.0f32, f32::max)
    }

    /// Iterate over all entries, frame by frame
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.frames.iter().flat_map(|frame| frame.iter().copied())
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [[f32; NUM_PITCH_CLASSES]] {
        &mut self.frames
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut f32> + '_ {
        self.frames.iter_mut().flat_map(|frame| frame.iter_mut())
    }

    /// Cyclically shift pitch classes so that row `semitones` becomes row 0
    ///
    /// Extractors that reference their bins to A (440 Hz) emit A in row 0;
    /// `rotate(3)` re-references such a profile to start at C.
    pub fn rotate(&self, semitones: usize) -> ChromaMatrix {
        let shift = semitones % NUM_PITCH_CLASSES;
        let frames = self
            .frames
            .iter()
            .map(|frame| {
                let mut rotated = *frame;
                rotated.rotate_left(shift);
                rotated
            })
            .collect();
        ChromaMatrix { frames }
    }

    /// Strongest pitch class in a frame, `None` for a silent frame
    ///
    /// Ties resolve to the lower pitch class.
    pub fn dominant_pitch_class(&self, frame_idx: usize) -> Option<PitchClass> {
        dominant(&self.frames[frame_idx])
    }

    /// Mean energy of each pitch class across all frames
    pub fn mean_profile(&self) -> [f32; NUM_PITCH_CLASSES] {
        let mut profile = [0.0f32; NUM_PITCH_CLASSES];
        for frame in &self.frames {
            for (acc, &v) in profile.iter_mut().zip(frame.iter()) {
                *acc += v;
            }
        }
        let n = self.frames.len() as f32;
        for acc in profile.iter_mut() {
            *acc /= n;
        }
        profile
    }

    /// Elementwise minimum with another matrix of the same size
    ///
    /// # Errors
    ///
    /// Returns `DimensionError` if the frame counts differ.
    pub fn min_with(&self, other: &ChromaMatrix) -> Result<ChromaMatrix, ChromaError> {
        if self.num_frames() != other.num_frames() {
            return Err(ChromaError::DimensionError(format!(
                "Cannot combine matrices with {} and {} frames",
                self.num_frames(),
                other.num_frames()
            )));
        }

        let frames = self
            .frames
            .iter()
            .zip(other.frames.iter())
            .map(|(a, b)| {
                let mut out = *a;
                for (o, &v) in out.iter_mut().zip(b.iter()) {
                    *o = o.min(v);
                }
                out
            })
            .collect();
        Ok(ChromaMatrix { frames })
    }
}

/// Index of the strongest bin in a 12-element profile
pub fn dominant(profile: &[f32; NUM_PITCH_CLASSES]) -> Option<PitchClass> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &v) in profile.iter().enumerate() {
        if v > 0.0 && best.map_or(true, |(_, b)| v > b) {
            best = Some((idx, v));
        }
    }
    best.map(|(idx, _)| PitchClass::from_index(idx))
}
