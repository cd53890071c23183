//! Delimited chroma tables
//!
//! Layout: one row per pitch class (C first), one comma-separated column per
//! frame, no header. Lines starting with `#` and blank lines are ignored and
//! whitespace around values is trimmed.
//!
//! # Example
//!
//! ```
//! use chroma_enhance::io::csv_table::{read_chroma_csv, write_chroma_csv};
//!
//! let table = "1,0.5\n0,0\n0,0\n0,0\n0.2,0\n0,0\n0,0\n0.4,0\n0,0\n0,0\n0,0\n0,0\n";
//! let chroma = read_chroma_csv(table.as_bytes())?;
//! assert_eq!(chroma.num_frames(), 2);
//!
//! let mut out = Vec::new();
//! write_chroma_csv(&mut out, &chroma)?;
//! # Ok::<(), chroma_enhance::ChromaError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use crate::chroma::matrix::ChromaMatrix;
use crate::error::ChromaError;

fn csv_error(context: &str, e: csv::Error) -> ChromaError {
    if e.is_io_error() {
        ChromaError::IoError(format!("{}: {}", context, e))
    } else {
        ChromaError::ParseError(format!("{}: {}", context, e))
    }
}

/// Parse a chroma table
///
/// # Errors
///
/// - `ParseError` for values that are not numbers
/// - `DimensionError` for ragged tables, a row count other than 12, or no columns
/// - `InvalidInput` for negative or non-finite values
pub fn read_chroma_csv<R: Read>(reader: R) -> Result<ChromaMatrix, ChromaError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<f32>> = Vec::with_capacity(12);
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| csv_error("reading chroma table", e))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(col_idx, field)| {
                field.parse::<f32>().map_err(|e| {
                    ChromaError::ParseError(format!(
                        "row {}, column {}: {:?} is not a number ({})",
                        row_idx, col_idx, field, e
                    ))
                })
            })
            .collect::<Result<Vec<f32>, ChromaError>>()?;
        rows.push(row);
    }

    log::debug!(
        "Read chroma table: {} rows, {} columns",
        rows.len(),
        rows.first().map_or(0, |r| r.len())
    );

    ChromaMatrix::from_rows(&rows)
}

/// Write a chroma table, one row per pitch class
///
/// # Errors
///
/// Returns `IoError` if the writer fails.
pub fn write_chroma_csv<W: Write>(writer: W, chroma: &ChromaMatrix) -> Result<(), ChromaError> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    for row in chroma.to_rows() {
        csv_writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| csv_error("writing chroma table", e))?;
    }
    csv_writer
        .flush()
        .map_err(|e| ChromaError::IoError(format!("flushing chroma table: {}", e)))
}

/// Read a chroma table from a file
///
/// # Errors
///
/// `IoError` if the file cannot be opened, otherwise as [`read_chroma_csv`].
pub fn read_chroma_csv_file<P: AsRef<Path>>(path: P) -> Result<ChromaMatrix, ChromaError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ChromaError::IoError(format!("{}: {}", path.display(), e)))?;
    read_chroma_csv(file)
}

/// Write a chroma table to a file, creating missing parent directories
///
/// # Errors
///
/// Returns `IoError` if the directory or file cannot be created or written.
pub fn write_chroma_csv_file<P: AsRef<Path>>(
    path: P,
    chroma: &ChromaMatrix,
) -> Result<(), ChromaError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| ChromaError::IoError(format!("{}: {}", parent.display(), e)))?;
    }
    let file = File::create(path)
        .map_err(|e| ChromaError::IoError(format!("{}: {}", path.display(), e)))?;
    write_chroma_csv(file, chroma)?;
    log::debug!("Wrote {} frames to {}", chroma.num_frames(), path.display());
    Ok(())
}
