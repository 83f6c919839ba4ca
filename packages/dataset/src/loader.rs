//! CSV loaders for the three source datasets.
//!
//! Every loader reads the whole file or fails: a file that cannot be opened
//! or a row that cannot be deserialized aborts with a [`LoadError`]. Empty
//! fields deserialize to `None`; columns the record types do not name are
//! ignored.

use std::path::{Path, PathBuf};

use police_residency_dataset_models::{AgencyTable, RawResidencyRecord, ShootingTable};
use serde::de::DeserializeOwned;

use crate::LoadError;

/// Default file name of the residency dataset.
pub const RESIDENCY_FILE: &str = "police-locals.csv";

/// Default file name of the agency dataset.
pub const AGENCIES_FILE: &str = "fatal-police-shootings-agencies.csv";

/// Default file name of the shootings dataset.
pub const SHOOTINGS_FILE: &str = "fatal-police-shootings-data.csv";

/// Locations of the three source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    /// Path to `police-locals.csv`.
    pub residency: PathBuf,
    /// Path to `fatal-police-shootings-agencies.csv`.
    pub agencies: PathBuf,
    /// Path to `fatal-police-shootings-data.csv`.
    pub shootings: PathBuf,
}

impl SourceFiles {
    /// Returns the default file names resolved against `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            residency: dir.join(RESIDENCY_FILE),
            agencies: dir.join(AGENCIES_FILE),
            shootings: dir.join(SHOOTINGS_FILE),
        }
    }
}

/// The three tables exactly as they were read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTables {
    /// Residency rows, still carrying the stale `city_old` column.
    pub residency: Vec<RawResidencyRecord>,
    /// All agencies.
    pub agencies: AgencyTable,
    /// All shootings, `armed` not yet derived.
    pub shootings: ShootingTable,
}

/// Loads all three source files.
///
/// # Errors
///
/// Returns [`LoadError`] for the first file that cannot be read or parsed.
pub fn load_all(files: &SourceFiles) -> Result<RawTables, LoadError> {
    Ok(RawTables {
        residency: load_residency(&files.residency)?,
        agencies: load_agencies(&files.agencies)?,
        shootings: load_shootings(&files.shootings)?,
    })
}

/// Loads `police-locals.csv`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened or parsed.
pub fn load_residency(path: &Path) -> Result<Vec<RawResidencyRecord>, LoadError> {
    read_csv(path, "residency")
}

/// Loads `fatal-police-shootings-agencies.csv`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened or parsed.
pub fn load_agencies(path: &Path) -> Result<AgencyTable, LoadError> {
    read_csv(path, "agencies")
}

/// Loads `fatal-police-shootings-data.csv`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be opened or parsed.
pub fn load_shootings(path: &Path) -> Result<ShootingTable, LoadError> {
    read_csv(path, "shootings")
}

fn read_csv<T: DeserializeOwned>(path: &Path, label: &str) -> Result<Vec<T>, LoadError> {
    log::debug!("[{label}] Reading {}", path.display());

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    log::info!("[{label}] Loaded {} rows from {}", rows.len(), path.display());

    Ok(rows)
}
