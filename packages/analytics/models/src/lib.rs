#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation policies, analysis configuration, and result types.
//!
//! Results are plain serializable structs so the report can be rendered as
//! text or emitted as JSON without further conversion.

use std::fmt;

use police_residency_dataset_models::Armed;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Name of the response variable in every regression model.
pub const RESPONSE: &str = "shooting_count";

/// How agencies without any attributed incident enter averages and models.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MissingCountPolicy {
    /// Leave them out entirely.
    #[default]
    Exclude,
    /// Count them as zero shootings.
    TreatAsZero,
}

/// Explanatory variable available to the regression models.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Predictor {
    /// Share of all officers living in-city.
    All,
    /// Share of white officers living in-city.
    White,
    /// Size of the police force.
    PoliceForceSize,
    /// Majority-residency indicator (1 when `all >= 0.5`).
    Majority,
}

/// A linear model `shooting_count ~ predictors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSpec {
    /// Explanatory variables, in coefficient order after the intercept.
    pub predictors: Vec<Predictor>,
}

impl ModelSpec {
    /// Creates a model over the given predictors.
    #[must_use]
    pub fn new(predictors: &[Predictor]) -> Self {
        Self {
            predictors: predictors.to_vec(),
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RESPONSE} ~ ")?;
        if self.predictors.is_empty() {
            return write!(f, "1");
        }
        for (i, predictor) in self.predictors.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{predictor}")?;
        }
        Ok(())
    }
}

/// Test statistic for a permutation test.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TestStatistic {
    /// Mean count of majority-residency agencies minus that of
    /// minority-residency agencies.
    /// The null shuffles the majority labels.
    DiffInMeans,
    /// OLS slope of count on the `all` share. The null shuffles the shares.
    Slope,
}

fn default_reps() -> usize {
    1000
}

const fn default_seed() -> u64 {
    20_150_829
}

fn default_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new(&[Predictor::All]),
        ModelSpec::new(&[Predictor::All, Predictor::PoliceForceSize]),
        ModelSpec::new(&[Predictor::Majority]),
    ]
}

fn default_tests() -> Vec<TestStatistic> {
    vec![TestStatistic::DiffInMeans, TestStatistic::Slope]
}

/// Settings for the statistical analysis stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Treatment of agencies with no attributed incident.
    pub missing_count_policy: MissingCountPolicy,
    /// Number of permutations per hypothesis test.
    pub permutation_reps: usize,
    /// Seed of the permutation RNG.
    pub seed: u64,
    /// Regression models to fit.
    pub models: Vec<ModelSpec>,
    /// Permutation tests to run.
    pub tests: Vec<TestStatistic>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            missing_count_policy: MissingCountPolicy::default(),
            permutation_reps: default_reps(),
            seed: default_seed(),
            models: default_models(),
            tests: default_tests(),
        }
    }
}

/// Shooting count for one agency name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyCount {
    /// Agency name.
    pub agency_name: String,
    /// Number of case rows attributed to the agency (always positive).
    pub count: u64,
}

/// Mean of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMean {
    /// Observations that entered the mean.
    pub n: usize,
    /// The mean, `None` when `n == 0`.
    pub mean: Option<f64>,
}

/// Mean shooting counts split by majority residency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorityMeans {
    /// Policy used for agencies with no incidents.
    pub policy: MissingCountPolicy,
    /// Agencies where most officers live in-city.
    pub majority: GroupMean,
    /// Agencies where most officers live outside the city.
    pub minority: GroupMean,
    /// `majority.mean - minority.mean` when both exist.
    pub difference: Option<f64>,
}

/// Five-number-style summary of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Non-missing observations.
    pub n: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation, `None` for a single observation.
    pub std_dev: Option<f64>,
    /// Smallest value.
    pub min: f64,
    /// Median.
    pub median: f64,
    /// Largest value.
    pub max: f64,
}

/// Summary of a named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    /// Column name.
    pub column: String,
    /// `None` when the column has no values.
    pub summary: Option<Summary>,
}

/// Number of case rows for one armed/majority combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmedCount {
    /// Armed classification (`None` for unmapped categories).
    pub armed: Option<Armed>,
    /// Majority-residency flag of the agency (`None` without a share).
    pub majority: Option<bool>,
    /// Number of case rows.
    pub count: u64,
}

/// One fitted coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coefficient {
    /// Term name (`"(intercept)"` or a predictor).
    pub term: String,
    /// Point estimate.
    pub estimate: f64,
    /// Standard error, `None` without residual degrees of freedom.
    pub std_error: Option<f64>,
    /// `estimate / std_error`.
    pub t_value: Option<f64>,
}

/// An ordinary least squares fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OlsFit {
    /// Model formula.
    pub formula: String,
    /// Observations used.
    pub n: usize,
    /// Intercept first, then one per predictor.
    pub coefficients: Vec<Coefficient>,
    /// Coefficient of determination.
    pub r_squared: f64,
}

/// Result of a permutation test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermutationTest {
    /// Statistic tested.
    pub statistic: TestStatistic,
    /// Statistic on the observed data.
    pub observed: f64,
    /// Number of permutations.
    pub reps: usize,
    /// Observations used.
    pub n: usize,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Null distribution, one value per permutation.
    #[serde(skip_serializing, default)]
    pub null_distribution: Vec<f64>,
}

/// Either a result or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome<T> {
    /// Computed successfully.
    Completed {
        /// The result.
        result: T,
    },
    /// Could not be computed.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

impl<T> Outcome<T> {
    /// Returns the result if it was computed.
    #[must_use]
    pub const fn result(&self) -> Option<&T> {
        match self {
            Self::Completed { result } => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(result) => Self::Completed { result },
            Err(e) => Self::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// A fitted (or failed) regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOutcome {
    /// Model formula.
    pub formula: String,
    /// The fit.
    pub outcome: Outcome<OlsFit>,
}

/// Everything computed by the analysis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Agencies in the per-agency table.
    pub agencies: usize,
    /// Agencies with at least one attributed incident.
    pub agencies_with_shootings: usize,
    /// Per-column summaries of the per-agency table.
    pub summaries: Vec<ColumnSummary>,
    /// Mean shootings by majority residency.
    pub majority_means: MajorityMeans,
    /// Case rows by armed classification and majority residency.
    pub armed_by_majority: Vec<ArmedCount>,
    /// Regression models.
    pub models: Vec<ModelOutcome>,
    /// Permutation tests.
    pub tests: Vec<Outcome<PermutationTest>>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn model_spec_formats_formula() {
        assert_eq!(
            ModelSpec::new(&[Predictor::All, Predictor::PoliceForceSize]).to_string(),
            "shooting_count ~ all + police_force_size"
        );
        assert_eq!(ModelSpec::new(&[]).to_string(), "shooting_count ~ 1");
    }

    #[test]
    fn policies_use_snake_case() {
        assert_eq!(
            MissingCountPolicy::from_str("treat_as_zero").unwrap(),
            MissingCountPolicy::TreatAsZero
        );
        assert_eq!(TestStatistic::DiffInMeans.to_string(), "diff_in_means");
        assert_eq!(
            Predictor::from_str("police_force_size").unwrap(),
            Predictor::PoliceForceSize
        );
    }

    #[test]
    fn outcome_from_result() {
        let ok: Outcome<u8> = Ok::<u8, String>(3).into();
        assert_eq!(ok.result(), Some(&3));

        let failed: Outcome<u8> = Err::<u8, _>("too few rows").into();
        assert_eq!(
            failed,
            Outcome::Failed {
                reason: "too few rows".to_string()
            }
        );
    }

    #[test]
    fn default_config_excludes_missing_counts() {
        let config = AnalysisConfig::default();
        assert_eq!(config.missing_count_policy, MissingCountPolicy::Exclude);
        assert_eq!(config.permutation_reps, 1000);
        assert_eq!(config.models.len(), 3);
    }
}
