#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end orchestration of the residency analysis.
//!
//! [`run`] loads the three source files, normalizes them, links them into
//! the two analytic tables, attaches per-agency shooting counts, and runs
//! the statistical analysis. [`link_only`] stops after linkage. Stage
//! progress is reported through a [`ProgressCallback`] so that binaries can
//! render it however they like.

pub mod config;
pub mod output;
pub mod progress;
pub mod report;

use std::path::PathBuf;

use police_residency_analytics::aggregate;
use police_residency_analytics_models::AnalysisReport;
use police_residency_dataset::loader::{self, RawTables};
use police_residency_dataset::normalize;
use police_residency_dataset::{LoadError, NormalizeError};
use police_residency_linkage_models::LinkedTables;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::progress::{ProgressCallback, Stages};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source file could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A source table could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration did not parse.
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// An output file or directory could not be written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A table could not be written as CSV.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// The report could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Everything produced by [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Both analytic tables (with shooting counts attached) and the
    /// linkage attrition.
    pub tables: LinkedTables,
    /// Statistical results.
    pub report: AnalysisReport,
}

/// Runs every stage from loading through analysis.
///
/// # Errors
///
/// Returns [`PipelineError`] if an input cannot be loaded or normalized.
/// Statistics that cannot be computed are recorded as failed in the report
/// instead.
pub fn run(
    config: &PipelineConfig,
    progress: &dyn ProgressCallback,
) -> Result<PipelineOutput, PipelineError> {
    let mut stages = Stages::new(progress, 5);

    let mut tables = load_and_link(config, &mut stages)?;

    stages.begin("Aggregating");
    let counts = aggregate::count_by_agency(&tables.shootings_case);
    tables.agencies_census = aggregate::attach_counts(tables.agencies_census, &counts);

    stages.begin("Analyzing");
    let report = police_residency_analytics::analyze(
        &tables.agencies_census,
        &tables.shootings_case,
        &config.analysis,
    );

    stages.finish("Analysis complete");

    Ok(PipelineOutput { tables, report })
}

/// Runs loading, normalization, and linkage only.
///
/// `shooting_count` is left empty on every per-agency row.
///
/// # Errors
///
/// Returns [`PipelineError`] if an input cannot be loaded or normalized.
pub fn link_only(
    config: &PipelineConfig,
    progress: &dyn ProgressCallback,
) -> Result<LinkedTables, PipelineError> {
    let mut stages = Stages::new(progress, 3);
    let tables = load_and_link(config, &mut stages)?;
    stages.finish("Linkage complete");
    Ok(tables)
}

fn load_and_link(
    config: &PipelineConfig,
    stages: &mut Stages<'_>,
) -> Result<LinkedTables, PipelineError> {
    stages.begin("Loading");
    let RawTables {
        residency,
        agencies,
        shootings,
    } = loader::load_all(&config.source_files())?;

    stages.begin("Normalizing");
    let residency = normalize::drop_stale_column(residency);
    let agencies = normalize::filter_departments(agencies);
    let shootings = normalize::classify_armed(shootings, config.linkage.unmapped_armed)?;

    stages.begin("Linking");
    Ok(police_residency_linkage::link(
        &agencies,
        &shootings,
        &residency,
        config.linkage.city_tie_break,
    ))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use police_residency_analytics_models::Outcome;
    use police_residency_dataset::loader::{AGENCIES_FILE, RESIDENCY_FILE, SHOOTINGS_FILE};
    use police_residency_dataset_models::{Armed, UnmappedArmedPolicy};

    use super::*;
    use crate::progress::NullProgress;
    use crate::report::{ReportFormat, render};

    const AGENCIES: &str = "\
id,name,type,state,oricodes,total_shootings
1,Springfield Police Department,local_police,OH,OH0570100,3
2,Clark County Sheriff's Office,sheriff,OH,OH0120000,1
3,Shelbyville Police Department,local_police,OH,OH0570200,0
";

    const RESIDENCY: &str = "\
city,state,police_force_size,all,white,city_old
Springfield,OH,120,0.5,0.45,Springfield
Capital City,OH,300,0.7,0.6,Capital City
";

    fn shootings(third_armed_with: &str) -> String {
        format!(
            "\
id,date,threat_type,flee_status,armed_with,city,county,state,latitude,longitude,location_precision,name,age,gender,race,race_source,was_mental_illness_related,body_camera,agency_ids
10,2015-01-02,shoot,not,gun,Springfield,Clark,OH,39.92,-83.80,not_available,A,30,male,W,not_available,False,False,1
11,2015-02-03,threat,foot,unarmed,Springfield,Clark,OH,,,not_available,B,,female,B,not_available,True,False,1
12,2016-03-04,attack,car,{third_armed_with},Springfield,Clark,OH,,,not_available,C,41,male,,not_available,False,True,1;2
13,2017-04-05,attack,not,knife,Xenia,Greene,OH,,,not_available,D,22,male,H,not_available,False,False,2
"
        )
    }

    fn write_inputs(dir: &Path, third_armed_with: &str) {
        std::fs::write(dir.join(AGENCIES_FILE), AGENCIES).unwrap();
        std::fs::write(dir.join(RESIDENCY_FILE), RESIDENCY).unwrap();
        std::fs::write(dir.join(SHOOTINGS_FILE), shootings(third_armed_with)).unwrap();
    }

    fn config_for(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: Some(dir.to_path_buf()),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn runs_springfield_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), "gun;vehicle");

        let output = run(&config_for(dir.path()), &NullProgress).unwrap();
        let tables = &output.tables;

        assert_eq!(tables.stats.agencies, 2);
        assert_eq!(tables.stats.incidents, 4);
        assert_eq!(tables.stats.incidents_with_agency_id, 3);
        assert_eq!(tables.stats.resolved_agencies, 1);
        assert_eq!(tables.stats.census_agencies, 1);

        assert_eq!(tables.agencies_census.len(), 1);
        let agency = &tables.agencies_census[0];
        assert_eq!(agency.id, 1);
        assert_eq!(agency.city, "Springfield");
        assert_eq!(agency.police_force_size, 120);
        assert_eq!(agency.majority, Some(true));
        assert_eq!(agency.shooting_count, Some(3));

        let ids: Vec<i64> = tables.shootings_case.iter().map(|r| r.incident_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(tables.shootings_case[1].armed, Some(Armed::No));
        assert_eq!(tables.shootings_case[2].armed, Some(Armed::Yes));
        assert!(tables.shootings_case.iter().all(|r| r.agency_id == 1));

        assert_eq!(output.report.agencies, 1);
        assert_eq!(output.report.majority_means.majority.mean, Some(3.0));
        assert!(
            output
                .report
                .models
                .iter()
                .all(|m| matches!(m.outcome, Outcome::Failed { .. }))
        );
    }

    #[test]
    fn unmapped_armament_fails_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), "taser");

        let err = run(&config_for(dir.path()), &NullProgress).unwrap_err();
        match err {
            PipelineError::Normalize(NormalizeError::UnmappedCategory { incident_id, value }) => {
                assert_eq!(incident_id, 12);
                assert_eq!(value, "taser");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unmapped_armament_can_be_nulled() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), "taser");

        let mut config = config_for(dir.path());
        config.linkage.unmapped_armed = UnmappedArmedPolicy::Null;

        let tables = link_only(&config, &NullProgress).unwrap();
        assert_eq!(tables.shootings_case[2].armed, None);
        assert_eq!(tables.agencies_census[0].shooting_count, None);
    }

    #[test]
    fn missing_input_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&config_for(dir.path()), &NullProgress).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)), "{err}");
        assert!(err.to_string().contains(RESIDENCY_FILE), "{err}");
    }

    #[test]
    fn renders_text_and_json_reports() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), "gun");
        let output = run(&config_for(dir.path()), &NullProgress).unwrap();

        let text = render(&output, ReportFormat::Text).unwrap();
        assert!(text.contains("agencies resolved to a city"));
        assert!(text.contains("shooting_count ~ all: FAILED"));
        assert!(text.contains("difference"));

        let json = render(&output, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["linkage"]["censusAgencies"], 1);
        assert_eq!(value["analysis"]["models"][0]["outcome"]["status"], "FAILED");
    }

    #[test]
    fn writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), "gun");
        let output = run(&config_for(dir.path()), &NullProgress).unwrap();

        let out_dir = dir.path().join("out");
        let written = output::write_tables(&output.tables, &out_dir).unwrap();

        let census = std::fs::read_to_string(&written.agencies_census).unwrap();
        let mut lines = census.lines();
        assert_eq!(
            lines.next(),
            Some("id,name,state,city,police_force_size,all,white,majority,shooting_count")
        );
        assert_eq!(
            lines.next(),
            Some("1,Springfield Police Department,OH,Springfield,120,0.5,0.45,true,3")
        );

        let case = std::fs::read_to_string(&written.shootings_case).unwrap();
        assert_eq!(case.lines().count(), 4);
        assert!(case.lines().next().unwrap().starts_with("incident_id,date,"));
    }
}
