//! Numeric kernels behind the charts: rolling means, pairwise correlation,
//! additive seasonal decomposition and grouped volatility.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{AnalysisError, Result};
use crate::statistics::Summary;
use crate::table::Table;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Trailing mean over `window` consecutive values.
///
/// A value is emitted only once the window is full and holds no missing
/// entries, so the first `window - 1` positions are always `None`. NaN and
/// infinite values count as missing.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(AnalysisError::invalid_parameter("rolling window must be at least 1"));
    }

    let mut result = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    let mut missing = 0usize;

    for (i, value) in values.iter().enumerate() {
        match finite(*value) {
            Some(v) => sum += v,
            None => missing += 1,
        }
        if i >= window {
            match finite(values[i - window]) {
                Some(v) => sum -= v,
                None => missing -= 1,
            }
        }

        let full = i + 1 >= window;
        result.push(if full && missing == 0 {
            Some(sum / window as f64)
        } else {
            None
        });
    }

    Ok(result)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Pearson correlation over rows where both series are present
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some((finite(*x)?, finite(*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Square matrix of pairwise correlations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major; `None` where a pair has too little overlap or zero variance
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == row)?;
        let c = self.labels.iter().position(|l| l == col)?;
        self.values[r][c]
    }
}

/// Correlation matrix over the named numeric columns; every column must exist
pub fn correlation_matrix<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
) -> Result<CorrelationMatrix> {
    let series = columns
        .iter()
        .map(|c| table.numeric(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let values = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();

    Ok(CorrelationMatrix {
        labels: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        values,
    })
}

/// Additive decomposition `observed = trend + seasonal + residual`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    pub period: usize,
    pub observed: Vec<f64>,
    /// Missing for the first and last `period / 2` points
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

/// Centred moving-average filter weights; even periods use a 2×period filter
fn trend_filter(period: usize) -> Vec<f64> {
    let p = period as f64;
    if period % 2 == 0 {
        let mut weights = vec![1.0 / p; period + 1];
        weights[0] = 0.5 / p;
        weights[period] = 0.5 / p;
        weights
    } else {
        vec![1.0 / p; period]
    }
}

/// Additive seasonal decomposition with a centred moving-average trend.
///
/// Requires a complete series (no missing values) of at least two full
/// cycles.
pub fn seasonal_decompose(values: &[Option<f64>], period: usize) -> Result<Decomposition> {
    if period == 0 {
        return Err(AnalysisError::invalid_parameter("period must be at least 1"));
    }

    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing > 0 {
        return Err(AnalysisError::MissingValues {
            column: "decomposition input".to_string(),
            count: missing,
        });
    }
    let observed: Vec<f64> = values.iter().flatten().copied().collect();

    let n = observed.len();
    if n < 2 * period {
        return Err(AnalysisError::insufficient(format!(
            "decomposition needs 2 complete cycles ({} observations), got {}",
            2 * period,
            n
        )));
    }

    let weights = trend_filter(period);
    let half = weights.len() / 2;
    let trend: Vec<Option<f64>> = (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            Some(
                weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * observed[i - half + k])
                    .sum(),
            )
        })
        .collect();

    let mut phase_means: Vec<f64> = (0..period)
        .map(|phase| {
            let detrended: Vec<f64> = (phase..n)
                .step_by(period)
                .filter_map(|i| trend[i].map(|t| observed[i] - t))
                .collect();
            if detrended.is_empty() {
                0.0
            } else {
                detrended.iter().sum::<f64>() / detrended.len() as f64
            }
        })
        .collect();
    let centre = phase_means.iter().sum::<f64>() / period as f64;
    for mean in &mut phase_means {
        *mean -= centre;
    }

    let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();
    let residual = (0..n)
        .map(|i| trend[i].map(|t| observed[i] - t - seasonal[i]))
        .collect();

    Ok(Decomposition {
        period,
        observed,
        trend,
        seasonal,
        residual,
    })
}

/// Calendar bucket for volatility grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityPeriod {
    Daily,
    /// Weeks ending on Sunday
    Weekly,
    #[default]
    Monthly,
}

impl VolatilityPeriod {
    /// Label of the bucket containing `date` (the bucket's last day)
    pub fn bucket_end(self, date: NaiveDate) -> NaiveDate {
        match self {
            VolatilityPeriod::Daily => date,
            VolatilityPeriod::Weekly => {
                let to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(to_sunday)
            }
            VolatilityPeriod::Monthly => month_end(date),
        }
    }

    fn next_bucket_end(self, end: NaiveDate) -> NaiveDate {
        match self {
            VolatilityPeriod::Daily => end + Duration::days(1),
            VolatilityPeriod::Weekly => end + Duration::days(7),
            VolatilityPeriod::Monthly => month_end(end + Duration::days(1)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VolatilityPeriod::Daily => "Daily",
            VolatilityPeriod::Weekly => "Weekly",
            VolatilityPeriod::Monthly => "Monthly",
        }
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| first - Duration::days(1))
        .unwrap_or(date)
}

/// Standard deviation per calendar bucket for each column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityTable {
    pub period: VolatilityPeriod,
    /// Bucket labels (last day of each bucket), ascending and gap-free
    pub buckets: Vec<NaiveDate>,
    pub columns: Vec<String>,
    /// `values[c][b]`: column `c`, bucket `b`; `None` with fewer than two observations
    pub values: Vec<Vec<Option<f64>>>,
}

impl VolatilityTable {
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        let position = self.columns.iter().position(|c| c == name)?;
        Some(&self.values[position])
    }
}

/// Sample standard deviation of each column within each calendar bucket.
///
/// Rows whose index cannot be read as a date are skipped and reported.
pub fn grouped_volatility<S: AsRef<str>>(
    table: &Table,
    columns: &[S],
    period: VolatilityPeriod,
    diagnostics: &dyn Diagnostics,
) -> Result<VolatilityTable> {
    let series = columns
        .iter()
        .map(|c| table.numeric(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let mut rows_by_bucket: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for (row, (raw, parsed)) in table.index().iter().zip(table.datetime_index()).enumerate() {
        match parsed {
            Some(dt) => rows_by_bucket
                .entry(period.bucket_end(dt.date()))
                .or_default()
                .push(row),
            None => diagnostics.report(Diagnostic::UnparseableIndex {
                row,
                value: raw.to_string(),
            }),
        }
    }

    let (Some(&first), Some(&last)) = (rows_by_bucket.keys().next(), rows_by_bucket.keys().last())
    else {
        return Err(AnalysisError::insufficient("no rows with a date/time index"));
    };

    let mut buckets = vec![first];
    while let Some(&current) = buckets.last() {
        if current >= last {
            break;
        }
        buckets.push(period.next_bucket_end(current));
    }

    let values = series
        .iter()
        .map(|values| {
            buckets
                .iter()
                .map(|bucket| {
                    let rows = rows_by_bucket.get(bucket)?;
                    let in_bucket: Vec<Option<f64>> = rows.iter().map(|&r| values[r]).collect();
                    let std_dev = Summary::of(&in_bucket).std_dev;
                    (!std_dev.is_nan()).then_some(std_dev)
                })
                .collect()
        })
        .collect();

    debug!(
        buckets = buckets.len(),
        columns = columns.len(),
        period = period.label(),
        "grouped volatility computed"
    );

    Ok(VolatilityTable {
        period,
        buckets,
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectedDiagnostics;
    use crate::table::IndexValue;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_rolling_mean_window_three() {
        let rolled = rolling_mean(&some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), 3).unwrap();
        assert_eq!(rolled[0], None);
        assert_eq!(rolled[1], None);
        assert_eq!(rolled[2], Some(2.0));
        assert_eq!(rolled[3], Some(3.0));
        assert_eq!(rolled[5], Some(5.0));
    }

    #[test]
    fn test_rolling_mean_missing_value_poisons_window() {
        let values = vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)];
        let rolled = rolling_mean(&values, 2).unwrap();
        assert_eq!(rolled, vec![None, Some(1.5), None, None, Some(4.5), Some(5.5)]);
    }

    #[test]
    fn test_rolling_mean_recovers_after_non_finite() {
        let values = vec![
            Some(f64::NAN),
            Some(1.0),
            Some(2.0),
            Some(f64::INFINITY),
            Some(4.0),
            Some(5.0),
        ];
        let rolled = rolling_mean(&values, 2).unwrap();
        assert_eq!(rolled, vec![None, None, Some(1.5), None, None, Some(4.5)]);
    }

    #[test]
    fn test_rolling_mean_rejects_zero_window() {
        assert!(rolling_mean(&some(&[1.0]), 0).is_err());
    }

    #[test]
    fn test_rolling_window_longer_than_series() {
        let rolled = rolling_mean(&some(&[1.0, 2.0]), 5).unwrap();
        assert!(rolled.iter().all(Option::is_none));
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let a = some(&[1.0, 2.0, 3.0, 4.0]);
        let b = some(&[2.0, 4.0, 6.0, 8.0]);
        let c = some(&[4.0, 3.0, 2.0, 1.0]);
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &c).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_uses_pairwise_complete_rows() {
        let a = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let b = vec![Some(1.0), Some(100.0), Some(3.0), Some(4.0)];
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&some(&[1.0, 1.0]), &some(&[1.0, 2.0])), None);
    }

    #[test]
    fn test_correlation_matrix_requires_columns() {
        let table = Table::new(vec![IndexValue::Text("0".into()), IndexValue::Text("1".into())])
            .with_column("a", vec![1.0, 2.0])
            .unwrap();
        let err = correlation_matrix(&table, &["a", "b"]).unwrap_err();
        assert!(matches!(err, AnalysisError::ColumnNotFound { .. }));

        let matrix = correlation_matrix(&table, &["a"]).unwrap();
        assert_eq!(matrix.get("a", "a"), Some(1.0));
    }

    #[test]
    fn test_seasonal_decompose_recovers_pattern() {
        let pattern = [1.0, -1.0, 2.0, -2.0];
        let values: Vec<Option<f64>> = (0..16)
            .map(|i| Some(10.0 + 0.5 * i as f64 + pattern[i % 4]))
            .collect();
        let decomposition = seasonal_decompose(&values, 4).unwrap();

        assert_eq!(decomposition.trend[0], None);
        assert_eq!(decomposition.trend[1], None);
        assert_eq!(decomposition.trend[14], None);
        let t2 = decomposition.trend[2].unwrap();
        assert!((t2 - 11.0).abs() < 1e-9);

        for (i, s) in decomposition.seasonal.iter().enumerate() {
            assert!((s - pattern[i % 4]).abs() < 1e-9);
        }
        for r in decomposition.residual.iter().flatten() {
            assert!(r.abs() < 1e-9);
        }
    }

    #[test]
    fn test_seasonal_decompose_odd_period_trend() {
        let values = some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let decomposition = seasonal_decompose(&values, 3).unwrap();
        assert_eq!(decomposition.trend[0], None);
        assert!((decomposition.trend[1].unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(decomposition.trend[5], None);
    }

    #[test]
    fn test_seasonal_decompose_errors() {
        assert!(matches!(
            seasonal_decompose(&some(&[1.0, 2.0, 3.0]), 2),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            seasonal_decompose(&[Some(1.0), None, Some(2.0), Some(3.0)], 2),
            Err(AnalysisError::MissingValues { count: 1, .. })
        ));
        assert!(seasonal_decompose(&some(&[1.0]), 0).is_err());
    }

    #[test]
    fn test_bucket_end_dates() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(
            VolatilityPeriod::Weekly.bucket_end(wednesday),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
        );
        assert_eq!(
            VolatilityPeriod::Monthly.bucket_end(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            VolatilityPeriod::Monthly.bucket_end(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_grouped_volatility_monthly_with_gap() {
        let index = vec![
            IndexValue::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            IndexValue::from(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            IndexValue::from(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()),
            IndexValue::Text("bad".into()),
            IndexValue::from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            IndexValue::from(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()),
        ];
        let table = Table::new(index)
            .with_column("x", vec![1.0, 2.0, 3.0, 99.0, 10.0, 20.0])
            .unwrap();
        let sink = CollectedDiagnostics::new();

        let vol = grouped_volatility(&table, &["x"], VolatilityPeriod::Monthly, &sink).unwrap();

        assert_eq!(vol.buckets.len(), 3);
        assert_eq!(vol.buckets[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let x = vol.column("x").unwrap();
        assert!((x[0].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(x[1], None);
        assert!((x[2].unwrap() - 50f64.sqrt()).abs() < 1e-9);
        assert_eq!(sink.len(), 1);
    }
}
