#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading and per-table cleaning of the three source datasets.
//!
//! [`loader`] parses the CSV files into typed tables without touching any
//! row. [`normalize`] then applies the cleaning rules: dropping the stale
//! residency column, keeping only city police departments, and deriving
//! the binary armed classification.

pub mod loader;
pub mod normalize;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort loading a source file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened.
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        /// Path of the file.
        path: PathBuf,
        /// Underlying CSV/I/O error.
        source: csv::Error,
    },

    /// A row or header could not be parsed into the expected record type.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Underlying CSV error (carries the row position).
        source: csv::Error,
    },
}

/// Errors raised while normalizing loaded tables.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// An `armed_with` value is not one of the known categories.
    #[error("Unmapped armed_with category {value:?} in incident {incident_id}")]
    UnmappedCategory {
        /// Incident carrying the value.
        incident_id: i64,
        /// The unrecognized value.
        value: String,
    },
}
