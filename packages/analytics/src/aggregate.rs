//! Per-agency shooting counts and group means.

use std::collections::BTreeMap;

use police_residency_analytics_models::{AgencyCount, GroupMean, MajorityMeans, MissingCountPolicy};
use police_residency_linkage_models::{AgenciesCensus, AgencyCensusRow, ShootingCaseRow};

/// Counts case rows per resolved agency name.
///
/// Agencies that appear in no case row are absent from the result, so every
/// count is positive. Agencies sharing a name share a count.
#[must_use]
pub fn count_by_agency(shootings_case: &[ShootingCaseRow]) -> Vec<AgencyCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for row in shootings_case {
        *counts.entry(row.agency_name.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(agency_name, count)| AgencyCount {
            agency_name: agency_name.to_string(),
            count,
        })
        .collect()
}

/// Left-joins shooting counts onto the per-agency table by agency name.
///
/// Agencies without a count keep `shooting_count = None`.
#[must_use]
pub fn attach_counts(agencies_census: AgenciesCensus, counts: &[AgencyCount]) -> AgenciesCensus {
    let by_name: BTreeMap<&str, u64> = counts
        .iter()
        .map(|c| (c.agency_name.as_str(), c.count))
        .collect();

    let rows: AgenciesCensus = agencies_census
        .into_iter()
        .map(|row| AgencyCensusRow {
            shooting_count: by_name.get(row.name.as_str()).copied(),
            ..row
        })
        .collect();

    let missing = rows.iter().filter(|r| r.shooting_count.is_none()).count();
    if missing > 0 {
        log::info!("{missing} agencies have no attributed shootings");
    }

    rows
}

/// Returns the shooting count of `row` as a response value under `policy`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn response_value(row: &AgencyCensusRow, policy: MissingCountPolicy) -> Option<f64> {
    match (row.shooting_count, policy) {
        (Some(count), _) => Some(count as f64),
        (None, MissingCountPolicy::TreatAsZero) => Some(0.0),
        (None, MissingCountPolicy::Exclude) => None,
    }
}

/// Computes the mean of `value` for each group returned by `group`,
/// skipping rows whose value is absent.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_by_group<T, K: Ord>(
    rows: &[T],
    group: impl Fn(&T) -> K,
    value: impl Fn(&T) -> Option<f64>,
) -> BTreeMap<K, GroupMean> {
    let mut sums: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(v) = value(row) else {
            continue;
        };
        let entry = sums.entry(group(row)).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(key, (sum, n))| {
            (
                key,
                GroupMean {
                    n,
                    mean: Some(sum / n as f64),
                },
            )
        })
        .collect()
}

/// Mean shooting count for majority- and minority-residency agencies.
///
/// Agencies without a residency share belong to neither group.
#[must_use]
pub fn majority_means(
    agencies_census: &[AgencyCensusRow],
    policy: MissingCountPolicy,
) -> MajorityMeans {
    let means = mean_by_group(
        agencies_census,
        |row| row.majority,
        |row| response_value(row, policy),
    );

    let empty = GroupMean { n: 0, mean: None };
    let majority = means.get(&Some(true)).copied().unwrap_or(empty);
    let minority = means.get(&Some(false)).copied().unwrap_or(empty);

    let difference = match (majority.mean, minority.mean) {
        (Some(a), Some(b)) => Some(a - b),
        _ => None,
    };

    MajorityMeans {
        policy,
        majority,
        minority,
        difference,
    }
}
