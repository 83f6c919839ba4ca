//! TOML configuration for a pipeline run.
//!
//! Every section is optional; an empty file (or no file) yields the
//! defaults:
//!
//! ```toml
//! data_dir = "data"
//!
//! [inputs]
//! residency = "police-locals.csv"
//! agencies = "fatal-police-shootings-agencies.csv"
//! shootings = "fatal-police-shootings-data.csv"
//!
//! [linkage]
//! city_tie_break = "lexicographic"
//! unmapped_armed = "fail"
//!
//! [analysis]
//! missing_count_policy = "exclude"
//! permutation_reps = 1000
//! seed = 20150829
//! models = [["all"], ["all", "police_force_size"], ["majority"]]
//! tests = ["diff_in_means", "slope"]
//! ```

use std::path::{Path, PathBuf};

use police_residency_analytics_models::AnalysisConfig;
use police_residency_dataset::loader::{
    AGENCIES_FILE, RESIDENCY_FILE, SHOOTINGS_FILE, SourceFiles,
};
use police_residency_dataset_models::UnmappedArmedPolicy;
use police_residency_linkage_models::CityTieBreak;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Environment variable that overrides the configured data directory.
pub const DATA_DIR_ENV: &str = "POLICE_RESIDENCY_DATA_DIR";

/// Data directory used when nothing else names one.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Complete configuration of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the three input files.
    pub data_dir: Option<PathBuf>,
    /// Input file names, relative to the data directory.
    pub inputs: InputFiles,
    /// Normalization and linkage policies.
    pub linkage: LinkageConfig,
    /// Statistical analysis settings.
    pub analysis: AnalysisConfig,
}

/// File names of the three inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    /// Residency dataset.
    pub residency: PathBuf,
    /// Agency dataset.
    pub agencies: PathBuf,
    /// Shooting incident dataset.
    pub shootings: PathBuf,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            residency: PathBuf::from(RESIDENCY_FILE),
            agencies: PathBuf::from(AGENCIES_FILE),
            shootings: PathBuf::from(SHOOTINGS_FILE),
        }
    }
}

/// Policies applied while cleaning and joining the inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkageConfig {
    /// City kept for agencies whose incidents name several.
    pub city_tie_break: CityTieBreak,
    /// Handling of unrecognized `armed_with` values.
    pub unmapped_armed: UnmappedArmedPolicy,
}

impl PipelineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the text is not valid TOML or
    /// names an unknown policy.
    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ConfigRead`] if the file cannot be read, or
    /// [`PipelineError::Config`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Resolves the data directory: `cli_override`, then the
    /// `POLICE_RESIDENCY_DATA_DIR` environment variable, then the configured
    /// `data_dir`, then `data/`.
    #[must_use]
    pub fn resolve_data_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        let env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        pick_data_dir(cli_override, env, self.data_dir.as_deref())
    }

    /// Returns the input paths inside the configured data directory.
    #[must_use]
    pub fn source_files(&self) -> SourceFiles {
        let dir = self
            .data_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_DATA_DIR));
        SourceFiles {
            residency: dir.join(&self.inputs.residency),
            agencies: dir.join(&self.inputs.agencies),
            shootings: dir.join(&self.inputs.shootings),
        }
    }
}

fn pick_data_dir(
    cli_override: Option<&Path>,
    env: Option<PathBuf>,
    configured: Option<&Path>,
) -> PathBuf {
    cli_override
        .map(Path::to_path_buf)
        .or(env)
        .or_else(|| configured.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use police_residency_analytics_models::{MissingCountPolicy, Predictor, TestStatistic};

    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.analysis.permutation_reps, 1000);
        assert_eq!(config.linkage.unmapped_armed, UnmappedArmedPolicy::Fail);
    }

    #[test]
    fn parses_partial_sections() {
        let config = PipelineConfig::from_toml_str(
            r#"
            data_dir = "/srv/data"

            [linkage]
            city_tie_break = "first_occurrence"

            [analysis]
            missing_count_policy = "treat_as_zero"
            permutation_reps = 250
            models = [["white", "majority"]]
            tests = ["slope"]
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/data")));
        assert_eq!(config.linkage.city_tie_break, CityTieBreak::FirstOccurrence);
        assert_eq!(config.linkage.unmapped_armed, UnmappedArmedPolicy::Fail);
        assert_eq!(
            config.analysis.missing_count_policy,
            MissingCountPolicy::TreatAsZero
        );
        assert_eq!(config.analysis.permutation_reps, 250);
        assert_eq!(config.analysis.seed, AnalysisConfig::default().seed);
        assert_eq!(
            config.analysis.models[0].predictors,
            vec![Predictor::White, Predictor::Majority]
        );
        assert_eq!(config.analysis.tests, vec![TestStatistic::Slope]);
        assert_eq!(config.inputs, InputFiles::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = PipelineConfig::from_toml_str("[linkage]\nunmapped_armed = \"ignore\"\n")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)), "{err}");
    }

    #[test]
    fn data_dir_precedence() {
        let cli = Path::new("cli");
        let configured = Path::new("configured");

        assert_eq!(
            pick_data_dir(Some(cli), Some(PathBuf::from("env")), Some(configured)),
            PathBuf::from("cli")
        );
        assert_eq!(
            pick_data_dir(None, Some(PathBuf::from("env")), Some(configured)),
            PathBuf::from("env")
        );
        assert_eq!(
            pick_data_dir(None, None, Some(configured)),
            PathBuf::from("configured")
        );
        assert_eq!(pick_data_dir(None, None, None), PathBuf::from("data"));
    }

    #[test]
    fn source_files_join_data_dir() {
        let config = PipelineConfig {
            data_dir: Some(PathBuf::from("in")),
            ..PipelineConfig::default()
        };
        let files = config.source_files();
        assert_eq!(files, SourceFiles::in_dir(Path::new("in")));
    }

    #[test]
    fn missing_config_file_names_path() {
        let err = PipelineConfig::load(Path::new("/nonexistent/police.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/police.toml"), "{err}");
    }
}
