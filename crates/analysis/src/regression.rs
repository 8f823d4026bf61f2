//! Least-squares regression forecaster.
//!
//! The model is ordinary least squares with an intercept, solved from the
//! normal equations. Accuracy is measured on a seeded held-out split before
//! the final model is refit on every usable period.

use crate::tables;
use chrono::NaiveDate;
use insights_core::artifact::{ForecastResult, ModelAccuracy, SeriesPoint};
use insights_core::config::ForecastConfig;
use insights_core::{CleanTable, InsightsError, InsightsResult};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const ANALYSIS: &str = "forecast";

/// Added to the feature diagonal of XᵀX to keep near-collinear features
/// solvable.
const RIDGE: f64 = 1e-8;
const PIVOT_EPSILON: f64 = 1e-12;

/// A fitted linear model `y = intercept + Σ coefficient_i · x_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Fit on `x` (rows × features) against `y`. `None` when the system is
    /// singular.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>) -> Option<Self> {
        let (rows, features) = x.dim();
        if rows == 0 || rows != y.len() {
            return None;
        }

        let mut design = Array2::<f64>::ones((rows, features + 1));
        design.slice_mut(ndarray::s![.., 1..]).assign(x);

        let mut gram = design.t().dot(&design);
        for i in 1..=features {
            gram[[i, i]] += RIDGE;
        }
        let rhs = design.t().dot(y);

        let beta = solve(gram, rhs)?;
        Some(Self {
            intercept: beta[0],
            coefficients: beta.iter().skip(1).copied().collect(),
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.axis_iter(Axis(0))
            .map(|row| self.predict_row(&row.to_vec()))
            .collect()
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let scale = a.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < PIVOT_EPSILON * scale {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// R², MAE and RMSE of `predicted` against `actual`.
pub fn accuracy(actual: &[f64], predicted: &[f64]) -> ModelAccuracy {
    let n = actual.len().max(1) as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let mut abs = 0.0;
    let mut sq = 0.0;
    let mut total = 0.0;
    for (a, p) in actual.iter().zip(predicted) {
        abs += (a - p).abs();
        sq += (a - p).powi(2);
        total += (a - mean).powi(2);
    }
    ModelAccuracy {
        r_squared: if total > 0.0 { Some(1.0 - sq / total) } else { None },
        mae: abs / n,
        rmse: (sq / n).sqrt(),
    }
}

/// Intercept and slope of `values` against their index.
pub fn linear_trend(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.len() < 2 {
        return (values.first().copied().unwrap_or(0.0), 0.0);
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        cov += dx * (y - mean_y);
        var += dx * dx;
    }
    let slope = cov / var;
    (mean_y - slope * mean_x, slope)
}

struct Period {
    date: Option<NaiveDate>,
    features: Vec<f64>,
    target: f64,
}

/// Usable periods: rows with a value for every feature and the target.
/// With a time column, rows sharing a date are summed into one period.
fn periods(table: &CleanTable, config: &ForecastConfig, target: &str) -> InsightsResult<Vec<Period>> {
    let features: Vec<Vec<Option<f64>>> = config
        .features
        .iter()
        .map(|f| tables::numbers(ANALYSIS, table, f))
        .collect::<InsightsResult<_>>()?;
    let targets = tables::numbers(ANALYSIS, table, target)?;
    let dates = if config.time_column.is_empty() {
        vec![None; table.len()]
    } else {
        tables::dates(ANALYSIS, table, &config.time_column)?
    };

    let rows = (0..table.len()).filter_map(|row| {
        let x: Option<Vec<f64>> = features.iter().map(|column| column[row]).collect();
        Some((dates[row], x?, targets[row]?))
    });

    if config.time_column.is_empty() {
        return Ok(rows
            .map(|(date, features, target)| Period {
                date,
                features,
                target,
            })
            .collect());
    }

    let mut by_date: BTreeMap<NaiveDate, Period> = BTreeMap::new();
    for (date, x, y) in rows {
        let Some(date) = date else { continue };
        let period = by_date.entry(date).or_insert_with(|| Period {
            date: Some(date),
            features: vec![0.0; x.len()],
            target: 0.0,
        });
        for (slot, v) in period.features.iter_mut().zip(&x) {
            *slot += v;
        }
        period.target += y;
    }
    Ok(by_date.into_values().collect())
}

fn to_matrix(periods: &[&Period], features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::<f64>::zeros((periods.len(), features));
    let mut y = Array1::<f64>::zeros(periods.len());
    for (i, p) in periods.iter().enumerate() {
        for (j, v) in p.features.iter().enumerate() {
            x[[i, j]] = *v;
        }
        y[i] = p.target;
    }
    (x, y)
}

/// Fit the forecaster on `table` and project `config.horizon` periods.
pub fn forecast(
    table: &CleanTable,
    config: &ForecastConfig,
    target: &str,
    seed: u64,
) -> InsightsResult<ForecastResult> {
    let periods = periods(table, config, target)?;
    let p = config.features.len();
    let n = periods.len();
    if n < p + 2 {
        return Err(InsightsError::degraded(
            ANALYSIS,
            format!("{n} usable periods, need at least {}", p + 2),
        ));
    }

    // Held-out split on a seeded shuffle; the training side keeps at least
    // one row per parameter.
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let test_rows = ((n as f64 * config.holdout_fraction).round() as usize)
        .max(1)
        .min(n - (p + 1));
    let (test_idx, train_idx) = order.split_at(test_rows);

    let train: Vec<&Period> = train_idx.iter().map(|&i| &periods[i]).collect();
    let test: Vec<&Period> = test_idx.iter().map(|&i| &periods[i]).collect();

    let (x_train, y_train) = to_matrix(&train, p);
    let holdout_model = LinearModel::fit(&x_train, &y_train)
        .ok_or_else(|| InsightsError::degraded(ANALYSIS, "singular system on training rows"))?;

    let (x_test, y_test) = to_matrix(&test, p);
    let predicted = holdout_model.predict(&x_test);
    let accuracy = accuracy(&y_test.to_vec(), &predicted.to_vec());
    debug!(train = train.len(), test = test.len(), r2 = ?accuracy.r_squared, "Holdout evaluated");

    let all: Vec<&Period> = periods.iter().collect();
    let (x_all, y_all) = to_matrix(&all, p);
    let model = LinearModel::fit(&x_all, &y_all)
        .ok_or_else(|| InsightsError::degraded(ANALYSIS, "singular system on all rows"))?;

    let history: Vec<SeriesPoint> = periods
        .iter()
        .enumerate()
        .map(|(i, period)| SeriesPoint {
            period: i,
            date: period.date,
            value: period.target,
        })
        .collect();

    let trends: Vec<(f64, f64)> = (0..p)
        .map(|j| {
            let series: Vec<f64> = periods.iter().map(|period| period.features[j]).collect();
            linear_trend(&series)
        })
        .collect();

    let step = match (periods[n - 1].date, periods[n - 2].date) {
        (Some(last), Some(prev)) => Some(last - prev),
        _ => None,
    };

    let predictions: Vec<SeriesPoint> = (1..=config.horizon)
        .map(|h| {
            let period = n - 1 + h;
            let projected: Vec<f64> = trends
                .iter()
                .map(|(a, b)| (a + b * period as f64).max(0.0))
                .collect();
            let date = match (periods[n - 1].date, step) {
                (Some(last), Some(step)) => last.checked_add_signed(step * h as i32),
                _ => None,
            };
            SeriesPoint {
                period,
                date,
                value: model.predict_row(&projected).max(0.0),
            }
        })
        .collect();

    info!(
        sheet = %table.name,
        column = target,
        periods = n,
        r2 = ?accuracy.r_squared,
        rmse = accuracy.rmse,
        "Forecast fitted"
    );

    Ok(ForecastResult {
        sheet: table.name.clone(),
        target: target.to_string(),
        features: config.features.clone(),
        intercept: model.intercept,
        coefficients: model.coefficients,
        train_rows: train.len(),
        test_rows: test.len(),
        accuracy,
        history,
        predictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::{Cell, CleanRecord, ColumnDef, ColumnType};
    use ndarray::array;

    fn traffic(weeks: usize) -> CleanTable {
        let mut t = CleanTable::new(
            "Website Traffic",
            vec![
                ColumnDef {
                    name: "Week Starting".into(),
                    column_type: ColumnType::Date,
                },
                ColumnDef {
                    name: "Sessions".into(),
                    column_type: ColumnType::Integer,
                },
                ColumnDef {
                    name: "New Users".into(),
                    column_type: ColumnType::Integer,
                },
                ColumnDef {
                    name: "Ticket Inquiry Conversions".into(),
                    column_type: ColumnType::Integer,
                },
            ],
        );
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        for w in 0..weeks {
            let sessions = 1000 + 50 * w as i64 + (w as i64 % 3) * 20;
            let new_users = 400 + 10 * w as i64 + (w as i64 % 2) * 15;
            let conversions = 2 + sessions / 100 + new_users / 50;
            t.records.push(CleanRecord {
                cells: vec![
                    Cell::Date(start + chrono::Duration::weeks(w as i64)),
                    Cell::Int(sessions),
                    Cell::Int(new_users),
                    Cell::Int(conversions),
                ],
            });
        }
        t
    }

    fn config() -> ForecastConfig {
        ForecastConfig::default()
    }

    #[test]
    fn test_fit_recovers_exact_linear_relation() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 5.0], [4.0, 3.0], [5.0, 8.0]];
        let y: Array1<f64> = x
            .axis_iter(Axis(0))
            .map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1])
            .collect();
        let model = LinearModel::fit(&x, &y).unwrap();

        assert!((model.intercept - 3.0).abs() < 1e-6);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((model.coefficients[1] + 0.5).abs() < 1e-6);
        assert!((model.predict_row(&[10.0, 4.0]) - 21.0).abs() < 1e-5);
    }

    #[test]
    fn test_solve_detects_singular_system() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(solve(a, b).is_none());
    }

    #[test]
    fn test_accuracy_metrics() {
        let acc = accuracy(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]);
        assert!((acc.mae - 1.0 / 3.0).abs() < 1e-12);
        assert!((acc.rmse - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((acc.r_squared.unwrap() - 0.5).abs() < 1e-12);

        let flat = accuracy(&[2.0, 2.0], &[2.0, 3.0]);
        assert!(flat.r_squared.is_none());
    }

    #[test]
    fn test_linear_trend() {
        let (a, b) = linear_trend(&[1.0, 3.0, 5.0, 7.0]);
        assert!((a - 1.0).abs() < 1e-12);
        assert!((b - 2.0).abs() < 1e-12);
        assert_eq!(linear_trend(&[4.0]), (4.0, 0.0));
    }

    #[test]
    fn test_forecast_is_deterministic_for_a_seed() {
        let table = traffic(12);
        let first = forecast(&table, &config(), "Ticket Inquiry Conversions", 7).unwrap();
        let second = forecast(&table, &config(), "Ticket Inquiry Conversions", 7).unwrap();
        assert_eq!(first, second);

        assert_eq!(first.train_rows + first.test_rows, 12);
        assert_eq!(first.test_rows, 3);
        assert_eq!(first.history.len(), 12);
        assert_eq!(first.predictions.len(), 4);
        assert_eq!(first.predictions[0].period, 12);
        assert_eq!(
            first.predictions[0].date,
            NaiveDate::from_ymd_opt(2026, 3, 30)
        );
        assert!(first.predictions.iter().all(|p| p.value >= 0.0));
    }

    #[test]
    fn test_forecast_aggregates_rows_per_date() {
        let mut table = traffic(6);
        let copies = table.records.clone();
        table.records.extend(copies);
        let result = forecast(&table, &config(), "Ticket Inquiry Conversions", 1).unwrap();
        assert_eq!(result.history.len(), 6);
        let first_week = traffic(6).records[0].cells[3].as_f64().unwrap();
        assert!((result.history[0].value - 2.0 * first_week).abs() < 1e-12);
    }

    #[test]
    fn test_forecast_degrades_on_too_few_rows() {
        let table = traffic(3);
        let err = forecast(&table, &config(), "Ticket Inquiry Conversions", 1).unwrap_err();
        assert!(matches!(err, InsightsError::AnalysisDegraded { .. }));
    }

    #[test]
    fn test_forecast_degrades_on_missing_target() {
        let table = traffic(10);
        let err = forecast(&table, &config(), "Revenue", 1).unwrap_err();
        assert!(matches!(err, InsightsError::AnalysisDegraded { .. }));
    }
}
