//! Permutation hypothesis tests on the per-agency table.
//!
//! The null distribution is built by shuffling one column relative to the
//! shooting counts, which breaks any association between the two while
//! keeping both marginal distributions. The RNG is seeded, so a test is
//! reproducible for a given seed.

use police_residency_analytics_models::{MissingCountPolicy, PermutationTest, TestStatistic};
use police_residency_linkage_models::AgencyCensusRow;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;

use crate::AnalyticsError;
use crate::aggregate::response_value;

/// Absolute slack when comparing null statistics against the observed one.
const TIE_TOLERANCE: f64 = 1e-12;

/// Runs a permutation test of `statistic` over the per-agency table.
///
/// # Errors
///
/// Returns [`AnalyticsError`] when `reps` is zero, a group has fewer than
/// two observations, or (for [`TestStatistic::Slope`]) the residency share
/// does not vary.
pub fn permutation_test(
    agencies_census: &[AgencyCensusRow],
    statistic: TestStatistic,
    reps: usize,
    seed: u64,
    policy: MissingCountPolicy,
) -> Result<PermutationTest, AnalyticsError> {
    if reps == 0 {
        return Err(AnalyticsError::InsufficientData {
            context: format!("{statistic} permutations"),
            needed: 1,
            found: 0,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let (observed, null_distribution, n) = match statistic {
        TestStatistic::DiffInMeans => {
            let (counts, mut labels): (Vec<f64>, Vec<bool>) = agencies_census
                .iter()
                .filter_map(|row| Some((response_value(row, policy)?, row.majority?)))
                .unzip();

            let majority = labels.iter().filter(|&&m| m).count();
            let smallest = majority.min(labels.len() - majority);
            if smallest < 2 {
                return Err(AnalyticsError::InsufficientData {
                    context: format!("{statistic} (smallest majority group)"),
                    needed: 2,
                    found: smallest,
                });
            }

            let observed = diff_in_means(&counts, &labels);
            let null: Vec<f64> = (0..reps)
                .map(|_| {
                    labels.shuffle(&mut rng);
                    diff_in_means(&counts, &labels)
                })
                .collect();
            (observed, null, counts.len())
        }
        TestStatistic::Slope => {
            let (mut shares, counts): (Vec<f64>, Vec<f64>) = agencies_census
                .iter()
                .filter_map(|row| Some((row.all?, response_value(row, policy)?)))
                .unzip();

            if shares.len() < 3 {
                return Err(AnalyticsError::InsufficientData {
                    context: statistic.to_string(),
                    needed: 3,
                    found: shares.len(),
                });
            }

            let observed = slope(&shares, &counts).ok_or_else(|| AnalyticsError::ZeroVariance {
                context: statistic.to_string(),
                column: "all".to_string(),
            })?;
            let null: Vec<f64> = (0..reps)
                .map(|_| {
                    shares.shuffle(&mut rng);
                    slope(&shares, &counts).unwrap_or(0.0)
                })
                .collect();
            (observed, null, counts.len())
        }
    };

    let p_value = two_sided_p_value(observed, &null_distribution);

    log::info!(
        "Permutation test {statistic}: observed {observed:.4}, p = {p_value:.4} ({reps} reps, n = {n})"
    );

    Ok(PermutationTest {
        statistic,
        observed,
        reps,
        n,
        p_value,
        null_distribution,
    })
}

/// Share of null statistics at least as extreme as `observed` in absolute
/// value.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn two_sided_p_value(observed: f64, null_distribution: &[f64]) -> f64 {
    if null_distribution.is_empty() {
        return 1.0;
    }
    let extreme = null_distribution
        .iter()
        .filter(|s| s.abs() + TIE_TOLERANCE >= observed.abs())
        .count();
    extreme as f64 / null_distribution.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn diff_in_means(values: &[f64], labels: &[bool]) -> f64 {
    let (mut sum_true, mut n_true, mut sum_false, mut n_false) = (0.0, 0_usize, 0.0, 0_usize);
    for (&value, &label) in values.iter().zip(labels) {
        if label {
            sum_true += value;
            n_true += 1;
        } else {
            sum_false += value;
            n_false += 1;
        }
    }
    sum_true / n_true as f64 - sum_false / n_false as f64
}

#[allow(clippy::cast_precision_loss)]
fn slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            let dx = xi - mean_x;
            (dx.mul_add(yi - mean_y, sxy), dx.mul_add(dx, sxx))
        });
    (sxx > 0.0).then(|| sxy / sxx)
}
