//! Ordinary least squares over the per-agency table.
//!
//! Models are small (an intercept plus a handful of predictors), so the fit
//! solves the normal equations directly by inverting `X'X` with
//! Gauss-Jordan elimination.

use police_residency_analytics_models::{
    Coefficient, MissingCountPolicy, ModelSpec, OlsFit, Predictor, RESPONSE,
};
use police_residency_linkage_models::AgencyCensusRow;

use crate::AnalyticsError;
use crate::aggregate::response_value;

const INTERCEPT: &str = "(intercept)";

/// Relative pivot size below which `X'X` is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Returns the value of `predictor` for `row`, `None` when missing.
#[must_use]
pub fn predictor_value(row: &AgencyCensusRow, predictor: Predictor) -> Option<f64> {
    match predictor {
        Predictor::All => row.all,
        Predictor::White => row.white,
        Predictor::PoliceForceSize => Some(f64::from(row.police_force_size)),
        Predictor::Majority => row.majority.map(|m| if m { 1.0 } else { 0.0 }),
    }
}

/// Fits `shooting_count ~ spec.predictors` over the per-agency table.
///
/// Rows missing the response (under `policy`) or any predictor are
/// dropped before fitting.
///
/// # Errors
///
/// Returns [`AnalyticsError`] when too few rows remain or the design is
/// singular.
pub fn fit_model(
    agencies_census: &[AgencyCensusRow],
    spec: &ModelSpec,
    policy: MissingCountPolicy,
) -> Result<OlsFit, AnalyticsError> {
    let mut y = Vec::new();
    let mut x = Vec::new();

    for row in agencies_census {
        let Some(response) = response_value(row, policy) else {
            continue;
        };
        let Some(values) = spec
            .predictors
            .iter()
            .map(|&p| predictor_value(row, p))
            .collect::<Option<Vec<f64>>>()
        else {
            continue;
        };
        y.push(response);
        x.push(values);
    }

    let names: Vec<String> = spec.predictors.iter().map(ToString::to_string).collect();
    let fit = fit_ols(&spec.to_string(), &y, &x, &names)?;

    log::debug!(
        "Fitted {} on {} rows (R^2 = {:.4})",
        fit.formula,
        fit.n,
        fit.r_squared
    );

    Ok(fit)
}

/// Fits an OLS model with an intercept.
///
/// `x` holds one row of predictor values per observation, in the order of
/// `names`.
///
/// # Errors
///
/// * [`AnalyticsError::InsufficientData`] without at least one residual
///   degree of freedom.
/// * [`AnalyticsError::ZeroVariance`] when the response is constant or a
///   predictor is constant or collinear.
#[allow(clippy::cast_precision_loss, clippy::needless_range_loop)]
pub fn fit_ols(
    formula: &str,
    y: &[f64],
    x: &[Vec<f64>],
    names: &[String],
) -> Result<OlsFit, AnalyticsError> {
    let n = y.len();
    let p = names.len() + 1;

    if n < p + 1 {
        return Err(AnalyticsError::InsufficientData {
            context: formula.to_string(),
            needed: p + 1,
            found: n,
        });
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &yi) in x.iter().zip(y) {
        let design = design_row(row);
        for i in 0..p {
            xty[i] += design[i] * yi;
            for j in 0..p {
                xtx[i][j] += design[i] * design[j];
            }
        }
    }

    let inverse = invert(&xtx).map_err(|column| AnalyticsError::ZeroVariance {
        context: formula.to_string(),
        column: if column == 0 {
            INTERCEPT.to_string()
        } else {
            names[column - 1].clone()
        },
    })?;

    let beta: Vec<f64> = inverse
        .iter()
        .map(|inv_row| inv_row.iter().zip(&xty).map(|(a, b)| a * b).sum())
        .collect();

    let mean_y = y.iter().sum::<f64>() / n as f64;
    let tss: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
    if tss == 0.0 {
        return Err(AnalyticsError::ZeroVariance {
            context: formula.to_string(),
            column: RESPONSE.to_string(),
        });
    }

    let rss: f64 = x
        .iter()
        .zip(y)
        .map(|(row, &yi)| {
            let fitted: f64 = design_row(row).iter().zip(&beta).map(|(d, b)| d * b).sum();
            (yi - fitted).powi(2)
        })
        .sum();

    let sigma2 = rss / (n - p) as f64;

    let coefficients = beta
        .iter()
        .enumerate()
        .map(|(i, &estimate)| {
            let variance = sigma2 * inverse[i][i];
            let std_error = (variance >= 0.0).then(|| variance.sqrt());
            Coefficient {
                term: if i == 0 {
                    INTERCEPT.to_string()
                } else {
                    names[i - 1].clone()
                },
                estimate,
                std_error,
                t_value: std_error.filter(|se| *se > 0.0).map(|se| estimate / se),
            }
        })
        .collect();

    Ok(OlsFit {
        formula: formula.to_string(),
        n,
        coefficients,
        r_squared: 1.0 - rss / tss,
    })
}

fn design_row(values: &[f64]) -> Vec<f64> {
    std::iter::once(1.0).chain(values.iter().copied()).collect()
}

/// Inverts a square matrix with partially pivoted Gauss-Jordan elimination.
///
/// Returns the index of the column whose pivot vanished when the matrix is
/// singular.
#[allow(clippy::needless_range_loop)]
fn invert(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, usize> {
    let size = matrix.len();
    let scale: Vec<f64> = (0..size).map(|i| matrix[i][i].abs()).collect();

    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut inv: Vec<Vec<f64>> = (0..size)
        .map(|i| (0..size).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..size {
        let pivot_row = (col..size)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);

        let pivot = a[pivot_row][col];
        if pivot.abs() <= PIVOT_TOLERANCE * scale[col] || pivot == 0.0 {
            return Err(col);
        }

        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        for j in 0..size {
            a[col][j] /= pivot;
            inv[col][j] /= pivot;
        }

        for r in 0..size {
            if r == col {
                continue;
            }
            let factor = a[r][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..size {
                a[r][j] -= factor * a[col][j];
                inv[r][j] -= factor * inv[col][j];
            }
        }
    }

    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::census;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn fits_simple_regression() {
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let x: Vec<Vec<f64>> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|&v| vec![v]).collect();

        let fit = fit_ols("y ~ x", &y, &x, &names(&["x"])).unwrap();

        assert_eq!(fit.n, 5);
        assert_eq!(fit.coefficients[0].term, "(intercept)");
        assert!((fit.coefficients[0].estimate - 2.2).abs() < 1e-9);
        assert!((fit.coefficients[1].estimate - 0.6).abs() < 1e-9);
        assert!((fit.r_squared - 0.6).abs() < 1e-9);
        let se = fit.coefficients[1].std_error.unwrap();
        assert!((se - 0.08_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn fits_two_predictors_exactly() {
        let rows = [(1.0, 0.0), (2.0, 1.0), (3.0, 5.0), (4.0, 2.0), (5.0, 3.0)];
        let x: Vec<Vec<f64>> = rows.iter().map(|&(a, b)| vec![a, b]).collect();
        let y: Vec<f64> = rows.iter().map(|&(a, b)| 3.0 + 2.0 * a - b).collect();

        let fit = fit_ols("y ~ a + b", &y, &x, &names(&["a", "b"])).unwrap();

        assert!((fit.coefficients[0].estimate - 3.0).abs() < 1e-9);
        assert!((fit.coefficients[1].estimate - 2.0).abs() < 1e-9);
        assert!((fit.coefficients[2].estimate + 1.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_rows_is_insufficient_data() {
        let err = fit_ols("y ~ x", &[1.0, 2.0], &[vec![1.0], vec![2.0]], &names(&["x"]))
            .unwrap_err();
        assert!(
            matches!(
                err,
                AnalyticsError::InsufficientData {
                    needed: 3,
                    found: 2,
                    ..
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn constant_predictor_is_zero_variance() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let x = vec![vec![0.4]; 4];

        let err = fit_ols("y ~ all", &y, &x, &names(&["all"])).unwrap_err();

        match err {
            AnalyticsError::ZeroVariance { column, .. } => assert_eq!(column, "all"),
            other @ AnalyticsError::InsufficientData { .. } => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn constant_response_is_zero_variance() {
        let y = [2.0, 2.0, 2.0, 2.0];
        let x: Vec<Vec<f64>> = [0.1, 0.2, 0.3, 0.4].iter().map(|&v| vec![v]).collect();

        let err = fit_ols("y ~ all", &y, &x, &names(&["all"])).unwrap_err();
        assert!(matches!(err, AnalyticsError::ZeroVariance { .. }), "{err}");
    }

    #[test]
    fn model_drops_rows_with_missing_values() {
        let mut rows = vec![
            census(1, 0.1, Some(9)),
            census(2, 0.3, Some(7)),
            census(3, 0.6, Some(4)),
            census(4, 0.8, Some(1)),
            census(5, 0.9, None),
        ];
        rows[1].all = None;

        let spec = ModelSpec::new(&[Predictor::All]);
        let fit = fit_model(&rows, &spec, MissingCountPolicy::Exclude).unwrap();
        assert_eq!(fit.n, 3);
        assert_eq!(fit.formula, "shooting_count ~ all");
        assert!(fit.coefficients[1].estimate < 0.0);

        let fit = fit_model(&rows, &spec, MissingCountPolicy::TreatAsZero).unwrap();
        assert_eq!(fit.n, 4);
    }

    #[test]
    fn majority_predictor_is_indicator() {
        let row = census(1, 0.5, Some(2));
        assert_eq!(predictor_value(&row, Predictor::Majority), Some(1.0));
        assert_eq!(predictor_value(&row, Predictor::PoliceForceSize), Some(100.0));

        let row = AgencyCensusRow {
            all: None,
            majority: None,
            ..row
        };
        assert_eq!(predictor_value(&row, Predictor::Majority), None);
        assert_eq!(predictor_value(&row, Predictor::All), None);
    }
}
