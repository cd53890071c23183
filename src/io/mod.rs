//! Chroma table I/O
//!
//! Reading and writing chromagrams as delimited text tables.

pub mod csv_table;
