//! Descriptive statistics over the analytic tables.

use std::collections::BTreeMap;

use police_residency_analytics_models::{
    ArmedCount, ColumnSummary, MissingCountPolicy, RESPONSE, Summary,
};
use police_residency_dataset_models::Armed;
use police_residency_linkage_models::{AgencyCensusRow, ShootingCaseRow};

use crate::aggregate::response_value;

/// Summarizes a column of values. Returns `None` for an empty column.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std_dev = (n > 1).then(|| {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });
    let median = if n % 2 == 0 {
        f64::midpoint(sorted[n / 2 - 1], sorted[n / 2])
    } else {
        sorted[n / 2]
    };

    Some(Summary {
        n,
        mean,
        std_dev,
        min: sorted[0],
        median,
        max: sorted[n - 1],
    })
}

/// Summarizes the numeric columns of the per-agency table.
#[must_use]
pub fn summarize_agencies(
    agencies_census: &[AgencyCensusRow],
    policy: MissingCountPolicy,
) -> Vec<ColumnSummary> {
    let column = |name: &str, values: Vec<f64>| ColumnSummary {
        column: name.to_string(),
        summary: summarize(&values),
    };

    vec![
        column(
            "police_force_size",
            agencies_census
                .iter()
                .map(|r| f64::from(r.police_force_size))
                .collect(),
        ),
        column(
            "all",
            agencies_census.iter().filter_map(|r| r.all).collect(),
        ),
        column(
            "white",
            agencies_census.iter().filter_map(|r| r.white).collect(),
        ),
        column(
            RESPONSE,
            agencies_census
                .iter()
                .filter_map(|r| response_value(r, policy))
                .collect(),
        ),
    ]
}

/// Counts case rows for every observed (armed, majority) combination.
#[must_use]
pub fn armed_by_majority(shootings_case: &[ShootingCaseRow]) -> Vec<ArmedCount> {
    let mut counts: BTreeMap<(Option<Armed>, Option<bool>), u64> = BTreeMap::new();
    for row in shootings_case {
        *counts.entry((row.armed, row.majority)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((armed, majority), count)| ArmedCount {
            armed,
            majority,
            count,
        })
        .collect()
}
