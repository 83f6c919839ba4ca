//! CSV output of the analytic tables.

use std::path::{Path, PathBuf};

use police_residency_linkage_models::{AgencyCensusRow, LinkedTables, ShootingCaseRow};
use serde::Serialize;

use crate::PipelineError;

/// File name of the per-incident table.
pub const SHOOTINGS_CASE_FILE: &str = "shootings_case.csv";

/// File name of the per-agency table.
pub const AGENCIES_CENSUS_FILE: &str = "agencies_census.csv";

/// Paths of the tables written by [`write_tables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTables {
    /// Path of `shootings_case.csv`.
    pub shootings_case: PathBuf,
    /// Path of `agencies_census.csv`.
    pub agencies_census: PathBuf,
}

/// Writes both analytic tables into `dir`, creating it if needed.
///
/// Each file starts with a header row, even when the table is empty.
///
/// # Errors
///
/// Returns [`PipelineError`] if the directory or a file cannot be written.
pub fn write_tables(tables: &LinkedTables, dir: &Path) -> Result<WrittenTables, PipelineError> {
    std::fs::create_dir_all(dir)?;

    let written = WrittenTables {
        shootings_case: dir.join(SHOOTINGS_CASE_FILE),
        agencies_census: dir.join(AGENCIES_CENSUS_FILE),
    };

    write_csv(&written.shootings_case, ShootingCaseRow::COLUMNS, &tables.shootings_case)?;
    write_csv(&written.agencies_census, AgencyCensusRow::COLUMNS, &tables.agencies_census)?;

    Ok(written)
}

fn write_csv<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<(), PipelineError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    if rows.is_empty() {
        log::warn!("Wrote an empty table to {}", path.display());
    } else {
        log::info!("Wrote {} rows to {}", rows.len(), path.display());
    }
    Ok(())
}
