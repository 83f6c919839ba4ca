#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-agency aggregation and statistical analysis.
//!
//! [`aggregate`] turns the per-incident table into per-agency shooting
//! counts and merges them into the per-agency table. [`describe`],
//! [`regression`] and [`permutation`] compute the statistics reported for
//! the residency question; [`analyze`] runs all of them according to an
//! [`AnalysisConfig`].

pub mod aggregate;
pub mod describe;
pub mod permutation;
pub mod regression;

use police_residency_analytics_models::{AnalysisConfig, AnalysisReport, ModelOutcome, Outcome};
use police_residency_linkage_models::{AgencyCensusRow, ShootingCaseRow};
use thiserror::Error;

/// Errors raised when a table cannot support a statistic.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Too few usable observations.
    #[error("Insufficient data for {context}: need at least {needed} observations, found {found}")]
    InsufficientData {
        /// What was being computed.
        context: String,
        /// Minimum number of observations required.
        needed: usize,
        /// Number of observations available.
        found: usize,
    },

    /// A column that must vary is constant (or collinear with others).
    #[error("Insufficient data for {context}: {column} has zero variance")]
    ZeroVariance {
        /// What was being computed.
        context: String,
        /// The offending column.
        column: String,
    },
}

/// Runs the descriptive statistics, regression models, and permutation
/// tests over the aggregated tables.
///
/// `agencies_census` must already carry shooting counts (see
/// [`aggregate::attach_counts`]). Models and tests that cannot be computed
/// are reported as [`Outcome::Failed`] rather than aborting the analysis.
#[must_use]
pub fn analyze(
    agencies_census: &[AgencyCensusRow],
    shootings_case: &[ShootingCaseRow],
    config: &AnalysisConfig,
) -> AnalysisReport {
    let policy = config.missing_count_policy;

    let models = config
        .models
        .iter()
        .map(|spec| {
            let outcome = regression::fit_model(agencies_census, spec, policy);
            if let Err(e) = &outcome {
                log::warn!("Model {spec} failed: {e}");
            }
            ModelOutcome {
                formula: spec.to_string(),
                outcome: outcome.into(),
            }
        })
        .collect();

    let tests = config
        .tests
        .iter()
        .map(|&statistic| {
            let outcome = permutation::permutation_test(
                agencies_census,
                statistic,
                config.permutation_reps,
                config.seed,
                policy,
            );
            if let Err(e) = &outcome {
                log::warn!("Permutation test {statistic} failed: {e}");
            }
            Outcome::from(outcome)
        })
        .collect();

    AnalysisReport {
        agencies: agencies_census.len(),
        agencies_with_shootings: agencies_census
            .iter()
            .filter(|row| row.shooting_count.is_some())
            .count(),
        summaries: describe::summarize_agencies(agencies_census, policy),
        majority_means: aggregate::majority_means(agencies_census, policy),
        armed_by_majority: describe::armed_by_majority(shootings_case),
        models,
        tests,
    }
}


#[cfg(test)]
mod tests {
    use police_residency_analytics_models::{
        MissingCountPolicy, ModelSpec, Outcome, Predictor, TestStatistic,
    };
    use police_residency_dataset_models::Armed;

    use super::*;
    use crate::test_support::{case, census};

    #[test]
    fn analyze_reports_failed_models_without_aborting() {
        let agencies = vec![census(1, 0.7, Some(3)), census(2, 0.2, None)];
        let cases = vec![
            case(10, "Agency 1 Police Department", Some(Armed::Yes), Some(true)),
            case(11, "Agency 1 Police Department", Some(Armed::No), Some(true)),
            case(12, "Agency 1 Police Department", Some(Armed::Yes), Some(true)),
        ];

        let report = analyze(&agencies, &cases, &AnalysisConfig::default());

        assert_eq!(report.agencies, 2);
        assert_eq!(report.agencies_with_shootings, 1);
        assert_eq!(report.models.len(), 3);
        assert!(
            report
                .models
                .iter()
                .all(|m| matches!(m.outcome, Outcome::Failed { .. }))
        );
        assert!(
            report
                .tests
                .iter()
                .all(|t| matches!(t, Outcome::Failed { .. }))
        );
        assert_eq!(report.majority_means.majority.mean, Some(3.0));
        assert_eq!(report.armed_by_majority.len(), 2);
    }

    #[test]
    fn analyze_fits_models_on_enough_data() {
        let agencies: Vec<AgencyCensusRow> = [
            (0.1, 9),
            (0.2, 8),
            (0.3, 8),
            (0.45, 6),
            (0.55, 5),
            (0.6, 4),
            (0.8, 2),
            (0.9, 1),
        ]
        .iter()
        .enumerate()
        .map(|(i, &(all, count))| census(i64::try_from(i).unwrap(), all, Some(count)))
        .collect();

        let config = AnalysisConfig {
            missing_count_policy: MissingCountPolicy::Exclude,
            permutation_reps: 200,
            seed: 3,
            models: AnalysisConfig::default().models,
            tests: vec![TestStatistic::DiffInMeans, TestStatistic::Slope],
        };

        let report = analyze(&agencies, &[], &config);

        let simple = report.models[0].outcome.result().unwrap();
        assert_eq!(simple.n, 8);
        assert!(simple.coefficients[1].estimate < 0.0);
        assert!(report.tests.iter().all(|t| t.result().is_some()));
        assert!(report.majority_means.difference.unwrap() < 0.0);
    }

    #[test]
    fn agencies_without_share_are_left_out_of_majority_statistics() {
        let mut agencies: Vec<AgencyCensusRow> = [(0.2, 9), (0.3, 7), (0.7, 2), (0.8, 3)]
            .iter()
            .enumerate()
            .map(|(i, &(all, count))| census(i64::try_from(i).unwrap(), all, Some(count)))
            .collect();
        let mut unclassified = census(9, 0.0, Some(100));
        unclassified.all = None;
        unclassified.majority = None;
        agencies.push(unclassified);

        let config = AnalysisConfig {
            permutation_reps: 50,
            models: vec![ModelSpec::new(&[Predictor::Majority])],
            tests: vec![TestStatistic::DiffInMeans],
            ..AnalysisConfig::default()
        };

        let report = analyze(&agencies, &[], &config);

        assert_eq!(report.majority_means.majority.n, 2);
        assert_eq!(report.majority_means.minority.n, 2);
        assert_eq!(report.majority_means.difference, Some(-5.5));
        assert_eq!(report.models[0].outcome.result().unwrap().n, 4);
        assert_eq!(report.tests[0].result().unwrap().n, 4);
    }
}
