#[cfg(test)]
mod tests {
    use crate::frame::{DailyFrame, DailySeries};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample() -> DailyFrame<f64> {
        let mut frame = DailyFrame::new();
        frame.insert(d(2), "AAPL", 0.01);
        frame.insert(d(3), "AAPL", -0.02);
        frame.insert(d(3), "MSFT", 0.03);
        frame.insert(d(4), "MSFT", f64::NAN);
        frame
    }

    #[test]
    fn test_insert_tracks_columns_and_dates() {
        let frame = sample();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.columns().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
        assert_eq!(frame.first_date(), Some(d(2)));
        assert_eq!(frame.last_date(), Some(d(4)));
        assert_eq!(frame.get(d(2), "MSFT"), None);
        assert_eq!(frame.get(d(3), "MSFT"), Some(0.03));
    }

    #[test]
    fn test_value_or_zero_treats_nan_and_missing_as_zero() {
        let frame = sample();
        assert_eq!(frame.value_or_zero(d(4), "MSFT"), 0.0);
        assert_eq!(frame.value_or_zero(d(2), "MSFT"), 0.0);
        assert!((frame.row_sum(d(3)) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_slice_is_inclusive_and_keeps_columns() {
        let frame = sample();
        let sliced = frame.slice(Some(d(3)), Some(d(3)));
        assert_eq!(sliced.len(), 1);
        assert!(sliced.has_column("AAPL"));
        assert_eq!(frame.slice(None, Some(d(2))).len(), 1);
        assert!(frame.slice(Some(d(5)), None).is_empty());
    }

    #[test]
    fn test_from_series_outer_joins() {
        let mut a: DailySeries<f64> = DailySeries::new();
        a.insert(d(2), 1.0);
        let mut b: DailySeries<f64> = DailySeries::new();
        b.insert(d(3), 2.0);
        let frame = DailyFrame::from_series(vec![("A", a), ("B", b)]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(d(2), "B"), None);
        assert_eq!(frame.column("B").len(), 1);
    }

    #[test]
    fn test_retain_columns_and_drop_empty_rows() {
        let mut frame = sample();
        frame.retain_columns(|c| c == "MSFT");
        assert_eq!(frame.column_count(), 1);
        assert_eq!(frame.len(), 3);
        frame.drop_empty_rows();
        assert_eq!(frame.dates().collect::<Vec<_>>(), vec![d(3), d(4)]);
    }

    #[test]
    fn test_common_dates_and_select() {
        let frame = sample();
        let mut other: DailyFrame<f64> = DailyFrame::new();
        other.insert(d(3), "X", 1.0);
        other.insert(d(9), "X", 1.0);
        let common = frame.common_dates(&other);
        assert_eq!(common, BTreeSet::from([d(3)]));
        assert_eq!(frame.select_dates(&common).len(), 1);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut frame = sample();
        let mut other = DailyFrame::new();
        other.insert(d(2), "AAPL", 0.5);
        other.insert(d(2), "JPM", 0.1);
        frame.merge(&other);
        assert_eq!(frame.get(d(2), "AAPL"), Some(0.5));
        assert!(frame.has_column("JPM"));
    }
}
