//! Rendering of a finished run as text or JSON.

use std::fmt;

use police_residency_analytics_models::{AnalysisReport, Outcome};
use police_residency_linkage_models::LinkageStats;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{PipelineError, PipelineOutput};

/// Output format of the report.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportFormat {
    /// Aligned plain text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// The serialized shape of a report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDocument<'a> {
    linkage: &'a LinkageStats,
    analysis: &'a AnalysisReport,
}

/// Renders `output` in the requested format.
///
/// # Errors
///
/// Returns [`PipelineError::Json`] if JSON serialization fails.
pub fn render(output: &PipelineOutput, format: ReportFormat) -> Result<String, PipelineError> {
    match format {
        ReportFormat::Text => Ok(TextReport(output).to_string()),
        ReportFormat::Json => render_json(output),
    }
}

/// Renders `output` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PipelineError::Json`] if serialization fails.
pub fn render_json(output: &PipelineOutput) -> Result<String, PipelineError> {
    Ok(serde_json::to_string_pretty(&ReportDocument {
        linkage: &output.tables.stats,
        analysis: &output.report,
    })?)
}

/// Plain-text rendering of a [`PipelineOutput`].
pub struct TextReport<'a>(pub &'a PipelineOutput);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.0.tables.stats;
        let report = &self.0.report;

        writeln!(f, "Linkage")?;
        for (label, value) in [
            ("department agencies", stats.agencies),
            ("incidents", stats.incidents),
            ("incidents with one agency id", stats.incidents_with_agency_id),
            ("agencies resolved to a city", stats.resolved_agencies),
            ("agencies with residency data", stats.census_agencies),
            ("case rows", stats.case_rows),
        ] {
            writeln!(f, "  {label:<30} {value:>8}")?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Agencies: {} ({} with at least one shooting)",
            report.agencies, report.agencies_with_shootings
        )?;

        writeln!(f)?;
        writeln!(f, "Column summaries")?;
        writeln!(
            f,
            "  {:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "column", "n", "mean", "std_dev", "min", "median", "max"
        )?;
        for column in &report.summaries {
            match &column.summary {
                Some(s) => writeln!(
                    f,
                    "  {:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10}",
                    column.column,
                    s.n,
                    num(Some(s.mean)),
                    num(s.std_dev),
                    num(Some(s.min)),
                    num(Some(s.median)),
                    num(Some(s.max)),
                )?,
                None => writeln!(f, "  {:<20} {:>6}", column.column, 0)?,
            }
        }

        let means = &report.majority_means;
        writeln!(f)?;
        writeln!(
            f,
            "Mean shootings by residency majority (missing counts: {})",
            means.policy
        )?;
        writeln!(
            f,
            "  {:<20} n = {:<6} mean = {}",
            "majority",
            means.majority.n,
            num(means.majority.mean)
        )?;
        writeln!(
            f,
            "  {:<20} n = {:<6} mean = {}",
            "minority",
            means.minority.n,
            num(means.minority.mean)
        )?;
        writeln!(f, "  {:<20} {}", "difference", num(means.difference))?;

        writeln!(f)?;
        writeln!(f, "Case rows by armed and majority")?;
        writeln!(f, "  {:<8} {:<8} {:>8}", "armed", "majority", "count")?;
        for row in &report.armed_by_majority {
            let armed = row.armed.as_ref().map_or("NA", AsRef::as_ref);
            let majority = match row.majority {
                Some(true) => "true",
                Some(false) => "false",
                None => "NA",
            };
            writeln!(f, "  {armed:<8} {majority:<8} {:>8}", row.count)?;
        }

        writeln!(f)?;
        writeln!(f, "Models")?;
        for model in &report.models {
            match &model.outcome {
                Outcome::Completed { result } => {
                    writeln!(
                        f,
                        "  {} (n = {}, R^2 = {})",
                        model.formula,
                        result.n,
                        num(Some(result.r_squared))
                    )?;
                    for c in &result.coefficients {
                        writeln!(
                            f,
                            "    {:<20} {:>10} {:>10} {:>10}",
                            c.term,
                            num(Some(c.estimate)),
                            num(c.std_error),
                            num(c.t_value)
                        )?;
                    }
                }
                Outcome::Failed { reason } => {
                    writeln!(f, "  {}: FAILED ({reason})", model.formula)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Permutation tests")?;
        for test in &report.tests {
            match test {
                Outcome::Completed { result } => writeln!(
                    f,
                    "  {:<14} observed = {} p = {} ({} reps, n = {})",
                    result.statistic.as_ref(),
                    num(Some(result.observed)),
                    num(Some(result.p_value)),
                    result.reps,
                    result.n
                )?,
                Outcome::Failed { reason } => writeln!(f, "  FAILED ({reason})")?,
            }
        }

        Ok(())
    }
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| format!("{v:.4}"))
}
