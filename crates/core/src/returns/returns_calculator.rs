//! Pure return arithmetic over date-indexed series and tables.

use chrono::{Datelike, NaiveDate};
use log::debug;
use quantterm_market_data::Quote;
use std::collections::BTreeMap;

use super::{CorrelationMatrix, MonthlyReturnsRow, ReturnInterval};
use crate::constants::{MAX_DAILY_RETURN, TRADING_DAYS_PER_YEAR};
use crate::frame::{in_range, DailySeries, ReturnsTable, WeightTable};
use crate::pricing::close_series;

/// Simple returns between consecutive observations. The first observation has
/// no prior close and is dropped; a zero or non-finite prior close yields no
/// return for that date.
pub fn pct_change(closes: &DailySeries<f64>) -> DailySeries<f64> {
    closes
        .iter()
        .zip(closes.iter().skip(1))
        .filter_map(|((_, prev), (date, close))| {
            if *prev == 0.0 || !prev.is_finite() || !close.is_finite() {
                return None;
            }
            Some((*date, close / prev - 1.0))
        })
        .collect()
}

/// Clamp every return to `[-bound, bound]`.
pub fn clip_series(series: &DailySeries<f64>, bound: f64) -> DailySeries<f64> {
    let clipped = series.values().filter(|r| r.abs() > bound).count();
    if clipped > 0 {
        debug!("Clipped {} returns beyond +/-{}", clipped, bound);
    }
    series
        .iter()
        .map(|(date, r)| (*date, r.clamp(-bound, bound)))
        .collect()
}

/// Clamp every cell of a returns table to `[-bound, bound]`.
pub fn clip_returns(table: &ReturnsTable, bound: f64) -> ReturnsTable {
    table.map_values(|r| r.clamp(-bound, bound))
}

/// Daily close-to-close returns from price bars, clipped to +/-100%.
pub fn daily_returns_from_bars(bars: &[Quote]) -> DailySeries<f64> {
    daily_returns_from_closes(&close_series(bars))
}

/// Daily returns from a close series, clipped to +/-100%.
pub fn daily_returns_from_closes(closes: &DailySeries<f64>) -> DailySeries<f64> {
    clip_series(&pct_change(closes), MAX_DAILY_RETURN)
}

/// Daily portfolio return as the weight-times-return sum across tickers.
///
/// Only dates present in both tables within `[start, end]` are returned.
/// Tickers missing from either side, and missing or NaN cells, contribute
/// zero for that day.
pub fn time_varying_daily_returns(
    weights: &WeightTable,
    returns: &ReturnsTable,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> DailySeries<f64> {
    if weights.is_empty() || returns.is_empty() {
        return DailySeries::new();
    }

    let tickers: Vec<&str> = weights
        .columns()
        .filter(|t| returns.has_column(t))
        .collect();

    weights
        .common_dates(returns)
        .into_iter()
        .filter(|date| in_range(*date, start, end))
        .map(|date| {
            let daily: f64 = tickers
                .iter()
                .map(|t| weights.value_or_zero(date, t) * returns.value_or_zero(date, t))
                .sum();
            (date, daily)
        })
        .collect()
}

/// Geometric linking: `prod(1 + r) - 1`. An empty input compounds to 0.
pub fn compound<I>(returns: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    returns.into_iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Compounded return of a whole series.
pub fn compound_series(series: &DailySeries<f64>) -> f64 {
    compound(series.values().copied())
}

fn bucket_key(date: NaiveDate, interval: ReturnInterval) -> (i32, u32) {
    match interval {
        ReturnInterval::Daily => (date.year(), date.ordinal()),
        ReturnInterval::Weekly => {
            let week = date.iso_week();
            (week.year(), week.week())
        }
        ReturnInterval::Monthly => (date.year(), date.month()),
        ReturnInterval::Yearly => (date.year(), 0),
    }
}

/// Resample daily returns by compounding within each week, month or year.
/// Each bucket is keyed by the last date observed in it.
pub fn resample_returns(series: &DailySeries<f64>, interval: ReturnInterval) -> DailySeries<f64> {
    if interval == ReturnInterval::Daily {
        return series.clone();
    }

    let mut buckets: BTreeMap<(i32, u32), (NaiveDate, f64)> = BTreeMap::new();
    for (date, r) in series {
        let entry = buckets
            .entry(bucket_key(*date, interval))
            .or_insert((*date, 1.0));
        entry.0 = *date;
        entry.1 *= 1.0 + r;
    }

    buckets
        .into_values()
        .map(|(last_date, growth)| (last_date, growth - 1.0))
        .collect()
}

/// Running `prod(1 + r) - 1` per ticker. Missing cells stay missing and do
/// not break the running product.
pub fn cumulative_returns(table: &ReturnsTable) -> ReturnsTable {
    let mut cumulative = ReturnsTable::with_columns(table.columns());
    for ticker in table.columns() {
        let mut growth = 1.0;
        for (date, r) in table.column(ticker) {
            if r.is_finite() {
                growth *= 1.0 + r;
                cumulative.insert(date, ticker, growth - 1.0);
            }
        }
    }
    for date in table.dates() {
        cumulative.ensure_row(date);
    }
    cumulative
}

/// Year-by-month grid of compounded monthly returns, newest year first.
pub fn monthly_returns_grid(daily: &DailySeries<f64>) -> Vec<MonthlyReturnsRow> {
    let monthly = resample_returns(daily, ReturnInterval::Monthly);

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for (date, r) in monthly {
        let months = years.entry(date.year()).or_insert([None; 12]);
        months[date.month0() as usize] = Some(r);
    }

    years
        .into_iter()
        .rev()
        .map(|(year, months)| {
            let available: Vec<f64> = months.iter().flatten().copied().collect();
            let ytd = if available.is_empty() {
                None
            } else {
                Some(compound(available))
            };
            MonthlyReturnsRow { year, months, ytd }
        })
        .collect()
}

fn pearson(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }
    let n_f = n as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n_f;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n_f;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Pairwise-complete Pearson correlation between every pair of columns.
pub fn correlation_matrix(table: &ReturnsTable) -> CorrelationMatrix {
    let tickers: Vec<String> = table.columns().map(str::to_string).collect();
    let columns: Vec<DailySeries<f64>> = tickers.iter().map(|t| table.column(t)).collect();

    let mut values = vec![vec![f64::NAN; tickers.len()]; tickers.len()];
    for i in 0..tickers.len() {
        for j in i..tickers.len() {
            let pairs: Vec<(f64, f64)> = columns[i]
                .iter()
                .filter_map(|(date, x)| {
                    columns[j]
                        .get(date)
                        .filter(|y| x.is_finite() && y.is_finite())
                        .map(|y| (*x, *y))
                })
                .collect();
            let corr = pearson(&pairs);
            values[i][j] = corr;
            values[j][i] = corr;
        }
    }

    CorrelationMatrix { tickers, values }
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

/// Annualized rolling volatility (sample standard deviation times sqrt(252)).
///
/// A row is kept only when every ticker has all of its trailing `window`
/// values present, so one gap in any column drops that date for all tickers.
pub fn rolling_volatility(table: &ReturnsTable, window: usize) -> ReturnsTable {
    let mut volatility = ReturnsTable::with_columns(table.columns());
    if window < 2 || table.column_count() == 0 {
        return volatility;
    }

    let dates: Vec<NaiveDate> = table.dates().collect();
    let annualization = TRADING_DAYS_PER_YEAR.sqrt();
    let columns: Vec<(&str, Vec<Option<f64>>)> = table
        .columns()
        .map(|ticker| {
            let cells = dates
                .iter()
                .map(|d| table.get(*d, ticker).filter(|v| v.is_finite()))
                .collect();
            (ticker, cells)
        })
        .collect();

    for end in window..=dates.len() {
        let row: Option<Vec<(&str, f64)>> = columns
            .iter()
            .map(|(ticker, cells)| {
                let trailing: Vec<f64> =
                    cells[end - window..end].iter().copied().collect::<Option<_>>()?;
                Some((*ticker, sample_std(&trailing) * annualization))
            })
            .collect();
        if let Some(row) = row {
            for (ticker, vol) in row {
                volatility.insert(dates[end - 1], ticker, vol);
            }
        }
    }

    volatility
}
