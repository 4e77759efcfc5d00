use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single date-indexed series. A date that is absent has no observation.
pub type DailySeries<T = f64> = BTreeMap<NaiveDate, T>;

/// Date-indexed table with one column per ticker.
///
/// Rows are kept in date order. A row may exist without a value for every
/// column; a missing cell means "no observation" and callers decide whether
/// it counts as zero. The column set is tracked separately so a ticker stays
/// known even on dates where it has no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct DailyFrame<T = f64> {
    columns: BTreeSet<String>,
    rows: BTreeMap<NaiveDate, BTreeMap<String, T>>,
}

impl<T> Default for DailyFrame<T> {
    fn default() -> Self {
        Self {
            columns: BTreeSet::new(),
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Copy> DailyFrame<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty frame with a known column set.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: BTreeMap::new(),
        }
    }

    /// Outer-join a set of series into one frame.
    pub fn from_series<I, S>(series: I) -> Self
    where
        I: IntoIterator<Item = (S, DailySeries<T>)>,
        S: Into<String>,
    {
        let mut frame = Self::new();
        for (column, values) in series {
            let column = column.into();
            frame.add_column(&column);
            for (date, value) in values {
                frame.insert(date, &column, value);
            }
        }
        frame
    }

    pub fn add_column(&mut self, column: &str) {
        if !self.columns.contains(column) {
            self.columns.insert(column.to_string());
        }
    }

    /// Make sure a row exists for `date`, even if it holds no values.
    pub fn ensure_row(&mut self, date: NaiveDate) {
        self.rows.entry(date).or_default();
    }

    pub fn insert(&mut self, date: NaiveDate, column: &str, value: T) {
        self.add_column(column);
        self.rows
            .entry(date)
            .or_default()
            .insert(column.to_string(), value);
    }

    pub fn get(&self, date: NaiveDate, column: &str) -> Option<T> {
        self.rows.get(&date).and_then(|row| row.get(column).copied())
    }

    pub fn row(&self, date: NaiveDate) -> Option<&BTreeMap<String, T>> {
        self.rows.get(&date)
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &BTreeMap<String, T>)> + '_ {
        self.rows.iter().map(|(date, row)| (*date, row))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.rows.contains_key(&date)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }

    /// Observed values of one column.
    pub fn column(&self, column: &str) -> DailySeries<T> {
        self.rows
            .iter()
            .filter_map(|(date, row)| row.get(column).map(|v| (*date, *v)))
            .collect()
    }

    /// Rows with `start <= date <= end`. `None` leaves that side open.
    pub fn slice(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|(date, _)| in_range(**date, start, end))
            .map(|(date, row)| (*date, row.clone()))
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Keep only the rows whose date is in `dates`.
    pub fn select_dates(&self, dates: &BTreeSet<NaiveDate>) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|(date, _)| dates.contains(*date))
            .map(|(date, row)| (*date, row.clone()))
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Keep only the columns accepted by `keep`.
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.columns.retain(|c| keep(c));
        let columns = &self.columns;
        for row in self.rows.values_mut() {
            row.retain(|c, _| columns.contains(c));
        }
    }

    /// Drop rows that hold no values at all.
    pub fn drop_empty_rows(&mut self) {
        self.rows.retain(|_, row| !row.is_empty());
    }

    /// Dates present in both frames.
    pub fn common_dates<U: Copy>(&self, other: &DailyFrame<U>) -> BTreeSet<NaiveDate> {
        self.rows
            .keys()
            .filter(|date| other.has_date(**date))
            .copied()
            .collect()
    }

    /// Apply `f` to every stored value, keeping the shape.
    pub fn map_values<U: Copy, F>(&self, mut f: F) -> DailyFrame<U>
    where
        F: FnMut(T) -> U,
    {
        let rows = self
            .rows
            .iter()
            .map(|(date, row)| {
                let mapped = row.iter().map(|(c, v)| (c.clone(), f(*v))).collect();
                (*date, mapped)
            })
            .collect();
        DailyFrame {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Copy in the columns of `other`; `other` wins on overlapping cells.
    pub fn merge(&mut self, other: &DailyFrame<T>) {
        for column in other.columns() {
            self.add_column(column);
        }
        for (date, row) in other.rows() {
            let target = self.rows.entry(date).or_default();
            for (column, value) in row {
                target.insert(column.clone(), *value);
            }
        }
    }
}

impl DailyFrame<f64> {
    /// Cell value with missing or non-finite cells read as zero.
    pub fn value_or_zero(&self, date: NaiveDate, column: &str) -> f64 {
        match self.get(date, column) {
            Some(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }

    /// Sum of the finite values in one row.
    pub fn row_sum(&self, date: NaiveDate) -> f64 {
        self.rows
            .get(&date)
            .map(|row| row.values().filter(|v| v.is_finite()).sum())
            .unwrap_or(0.0)
    }
}

pub(crate) fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

/// Restrict a series to `start <= date <= end`.
pub fn slice_series<T: Copy>(
    series: &DailySeries<T>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> DailySeries<T> {
    series
        .iter()
        .filter(|(date, _)| in_range(**date, start, end))
        .map(|(date, v)| (*date, *v))
        .collect()
}
