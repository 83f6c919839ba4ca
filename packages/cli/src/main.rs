#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the police residency analysis.
//!
//! `run` executes the whole pipeline and prints the report; `link` stops
//! after linkage and writes the two analytic tables. Without a subcommand
//! the tool prompts for its settings interactively.
//!
//! Uses `indicatif-log-bridge` (via [`police_residency_cli_utils::init_logger`])
//! so log lines and the stage bar never fight for the terminal.

mod interactive;

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use police_residency_analytics_models::MissingCountPolicy;
use police_residency_cli_utils::{IndicatifProgress, MultiProgress};
use police_residency_pipeline::PipelineError;
use police_residency_pipeline::config::PipelineConfig;
use police_residency_pipeline::output::write_tables;
use police_residency_pipeline::report::{ReportFormat, render};

#[derive(Parser)]
#[command(
    name = "police_residency",
    about = "Links police residency, agency, and shooting data and analyzes it"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the inputs and settings come from.
#[derive(Args)]
struct InputArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the three input CSV files (overrides
    /// `POLICE_RESIDENCY_DATA_DIR` and the config's `data_dir`)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run linkage and the statistical analysis, then print the report
    Run {
        #[command(flatten)]
        input: InputArgs,
        /// Also write `shootings_case.csv` and `agencies_census.csv` here
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Report format (`text` or `json`)
        #[arg(
            long,
            default_value_t = ReportFormat::Text,
            value_parser = parse_strum::<ReportFormat>
        )]
        format: ReportFormat,
        /// Permutations per hypothesis test
        #[arg(long)]
        reps: Option<usize>,
        /// Seed of the permutation RNG
        #[arg(long)]
        seed: Option<u64>,
        /// Treatment of agencies without shootings (`exclude` or `treat_as_zero`)
        #[arg(long, value_parser = parse_strum::<MissingCountPolicy>)]
        missing_counts: Option<MissingCountPolicy>,
    },
    /// Link the three datasets and write the analytic tables
    Link {
        #[command(flatten)]
        input: InputArgs,
        /// Directory to write the tables into
        #[arg(long)]
        output_dir: PathBuf,
    },
}

/// Parses a strum-derived enum from its snake_case spelling.
fn parse_strum<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Debug,
{
    T::from_str(value).map_err(|e| format!("unrecognized value {value:?} ({e:?})"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = police_residency_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi);
    };

    match command {
        Commands::Run {
            input,
            output_dir,
            format,
            reps,
            seed,
            missing_counts,
        } => {
            let mut config = load_config(input.config.as_deref(), input.data_dir.as_deref())?;
            if let Some(reps) = reps {
                config.analysis.permutation_reps = reps;
            }
            if let Some(seed) = seed {
                config.analysis.seed = seed;
            }
            if let Some(policy) = missing_counts {
                config.analysis.missing_count_policy = policy;
            }
            run_analysis(&multi, &config, output_dir.as_deref(), format)?;
        }
        Commands::Link { input, output_dir } => {
            let config = load_config(input.config.as_deref(), input.data_dir.as_deref())?;
            run_linkage(&multi, &config, &output_dir)?;
        }
    }

    Ok(())
}

/// Loads the config file (if any) and pins its data directory.
pub(crate) fn load_config(
    path: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<PipelineConfig, PipelineError> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.data_dir = Some(config.resolve_data_dir(data_dir));
    Ok(config)
}

pub(crate) fn run_analysis(
    multi: &MultiProgress,
    config: &PipelineConfig,
    output_dir: Option<&Path>,
    format: ReportFormat,
) -> Result<(), PipelineError> {
    let progress = IndicatifProgress::stages_bar(multi, "Starting");
    let output = police_residency_pipeline::run(config, progress.as_ref())?;

    if let Some(dir) = output_dir {
        let written = write_tables(&output.tables, dir)?;
        log::info!(
            "Tables written to {} and {}",
            written.shootings_case.display(),
            written.agencies_census.display()
        );
    }

    println!("{}", render(&output, format)?);
    Ok(())
}

pub(crate) fn run_linkage(
    multi: &MultiProgress,
    config: &PipelineConfig,
    output_dir: &Path,
) -> Result<(), PipelineError> {
    let progress = IndicatifProgress::stages_bar(multi, "Starting");
    let tables = police_residency_pipeline::link_only(config, progress.as_ref())?;
    let written = write_tables(&tables, output_dir)?;

    println!(
        "{} agencies, {} case rows",
        tables.stats.census_agencies, tables.stats.case_rows
    );
    println!("  {}", written.agencies_census.display());
    println!("  {}", written.shootings_case.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_options() {
        let cli = Cli::try_parse_from([
            "police_residency",
            "run",
            "--data-dir",
            "in",
            "--format",
            "json",
            "--missing-counts",
            "treat_as_zero",
            "--reps",
            "250",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run {
                input,
                format,
                missing_counts,
                reps,
                seed,
                output_dir,
            }) => {
                assert_eq!(input.data_dir, Some(PathBuf::from("in")));
                assert_eq!(format, ReportFormat::Json);
                assert_eq!(missing_counts, Some(MissingCountPolicy::TreatAsZero));
                assert_eq!(reps, Some(250));
                assert_eq!(seed, None);
                assert_eq!(output_dir, None);
            }
            _ => panic!("expected the run subcommand"),
        }
    }

    #[test]
    fn format_defaults_to_text() {
        let cli = Cli::try_parse_from(["police_residency", "run"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Run {
                format: ReportFormat::Text,
                ..
            })
        ));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = Cli::try_parse_from(["police_residency", "run", "--format", "yaml"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("yaml"), "{err}");
    }

    #[test]
    fn link_requires_output_dir() {
        assert!(Cli::try_parse_from(["police_residency", "link"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["police_residency", "link", "--output-dir", "out"])
                .unwrap()
                .command,
            Some(Commands::Link { .. })
        ));
    }

    #[test]
    fn no_subcommand_selects_interactive_mode() {
        let cli = Cli::try_parse_from(["police_residency"]).unwrap();
        assert!(cli.command.is_none());
    }
}
