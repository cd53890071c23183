//! Enhancement result types

pub mod result;
