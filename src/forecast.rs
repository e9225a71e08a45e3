//! Linear trend forecast
//!
//! Fits `value = intercept + slope * daysSinceStart` by ordinary least
//! squares and extrapolates it over consecutive calendar days after the last
//! observation. This is a trend projection for exploration, not a validated
//! forecasting model.

use crate::errors::{AnalysisError, Result};
use crate::table::Table;
use chrono::{Duration, NaiveDateTime};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::debug;

/// Name of the derived elapsed-days column
pub const DAYS_SINCE_START: &str = "daysSinceStart";

/// Default number of days to extrapolate
pub const DEFAULT_FORECAST_DAYS: usize = 30;

const SVD_EPSILON: f64 = 1e-12;

/// Whole days elapsed since the earliest index value, per row
pub fn days_since_start(index: &[NaiveDateTime]) -> Result<Vec<i64>> {
    let start = index
        .iter()
        .min()
        .ok_or_else(|| {
            AnalysisError::insufficient("cannot derive elapsed days from an empty index")
        })?;
    Ok(index.iter().map(|dt| (*dt - *start).num_days()).collect())
}

/// Copy of `table` with a `daysSinceStart` column appended
pub fn with_days_since_start(table: &Table) -> Result<Table> {
    let index = table.require_datetime_index()?;
    let days = days_since_start(&index)?;
    table.with_numeric(
        DAYS_SINCE_START,
        days.into_iter().map(|d| Some(d as f64)).collect(),
    )
}

/// Fitted straight line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearTrend {
    /// Least-squares fit of `y` on `x`
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(AnalysisError::ShapeMismatch {
                message: format!("{} features for {} targets", x.len(), y.len()),
            });
        }
        if x.is_empty() {
            return Err(AnalysisError::insufficient("regression needs at least one observation"));
        }

        let n = x.len();
        let x_mean = x.iter().sum::<f64>() / n as f64;
        let y_mean = y.iter().sum::<f64>() / n as f64;

        // Centred design: slope from the deviations, intercept recovered from the means
        let design = DMatrix::from_iterator(n, 1, x.iter().map(|v| v - x_mean));
        let target = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));

        let solution = design
            .svd(true, true)
            .solve(&target, SVD_EPSILON)
            .map_err(|message| AnalysisError::Regression {
                message: message.to_string(),
            })?;

        let slope = solution[0];
        Ok(Self {
            intercept: y_mean - slope * x_mean,
            slope,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Historical series, fitted line and extrapolated forecast for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub column: String,
    pub trend: LinearTrend,
    pub history: Vec<(NaiveDateTime, f64)>,
    pub fitted: Vec<(NaiveDateTime, f64)>,
    pub forecast: Vec<(NaiveDateTime, f64)>,
}

impl Forecast {
    pub fn forecast_values(&self) -> Vec<f64> {
        self.forecast.iter().map(|(_, v)| *v).collect()
    }
}

/// Fit a linear trend to `column` against elapsed days and extrapolate it
/// `forecast_days` calendar days past the last row.
pub fn forecast_linear(table: &Table, column: &str, forecast_days: usize) -> Result<Forecast> {
    if forecast_days == 0 {
        return Err(AnalysisError::invalid_parameter("forecast horizon must be at least one day"));
    }

    let values = table.numeric(column)?;
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing > 0 {
        return Err(AnalysisError::MissingValues {
            column: column.to_string(),
            count: missing,
        });
    }
    let y: Vec<f64> = values.iter().flatten().copied().collect();

    let index = table.require_datetime_index()?;
    let days = days_since_start(&index)?;
    let x: Vec<f64> = days.iter().map(|&d| d as f64).collect();

    let trend = LinearTrend::fit(&x, &y)?;

    let history: Vec<(NaiveDateTime, f64)> = index.iter().copied().zip(y.iter().copied()).collect();
    let fitted = index
        .iter()
        .zip(&x)
        .map(|(dt, &day)| (*dt, trend.predict(day)))
        .collect();

    // The table is not necessarily sorted: dates continue from the last row,
    // elapsed days from the largest offset.
    let last_date = index[index.len() - 1];
    let last_day = days.iter().copied().max().unwrap_or(0);
    let forecast = (1..=forecast_days as i64)
        .map(|i| {
            (
                last_date + Duration::days(i),
                trend.predict((last_day + i) as f64),
            )
        })
        .collect();

    debug!(
        column,
        slope = trend.slope,
        intercept = trend.intercept,
        forecast_days,
        "linear trend fitted"
    );

    Ok(Forecast {
        column: column.to_string(),
        trend,
        history,
        fitted,
        forecast,
    })
}
