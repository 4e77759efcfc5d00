#[cfg(test)]
mod tests {
    use crate::frame::ReturnsTable;
    use crate::returns::{read_returns_csv, write_returns_csv, CacheConfig, ReturnsCache};
    use chrono::{Duration, NaiveDate, Utc};
    use std::cell::Cell;
    use tempfile::tempdir;

    fn sample_table() -> ReturnsTable {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut table = ReturnsTable::new();
        table.insert(d1, "AAPL", 0.01);
        table.insert(d1, "MSFT", -0.02);
        table.insert(d2, "AAPL", 0.015);
        table
    }

    #[test]
    fn test_cache_path_sanitizes_portfolio_name() {
        let cache = ReturnsCache::new(CacheConfig::new("/tmp/qt"));
        let path = cache.cache_path("My Portfolio/2024");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "My_Portfolio_2024_returns.csv"
        );
        let path = cache.cache_path("growth-fund_v2");
        assert!(path.ends_with("growth-fund_v2_returns.csv"));
    }

    #[test]
    fn test_default_config_lives_under_quant_terminal() {
        let config = CacheConfig::default();
        assert!(config.cache_dir.ends_with(".quant_terminal/cache/returns"));
    }

    #[test]
    fn test_csv_keeps_missing_cells_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t_returns.csv");
        let table = sample_table();

        write_returns_csv(&path, &table).unwrap();
        let loaded = read_returns_csv(&path).unwrap();

        assert_eq!(loaded, table);
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(loaded.get(d2, "MSFT"), None);
    }

    #[test]
    fn test_second_call_hits_cache_when_ledger_is_older() {
        let dir = tempdir().unwrap();
        let cache = ReturnsCache::new(CacheConfig::new(dir.path()));
        let modified = Some(Utc::now() - Duration::hours(1));
        let calls = Cell::new(0);

        let compute = || {
            calls.set(calls.get() + 1);
            sample_table()
        };
        let first = cache.get_or_compute("Growth", modified, compute);
        let second = cache.get_or_compute("Growth", modified, || {
            calls.set(calls.get() + 1);
            ReturnsTable::new()
        });

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert!(cache.cache_path("Growth").exists());
    }

    #[test]
    fn test_disk_entry_survives_new_cache_instance() {
        let dir = tempdir().unwrap();
        let modified = Some(Utc::now() - Duration::hours(1));
        {
            let cache = ReturnsCache::new(CacheConfig::new(dir.path()));
            cache.get_or_compute("Growth", modified, sample_table);
        }

        let cache = ReturnsCache::new(CacheConfig::new(dir.path()));
        let loaded = cache.get_or_compute("Growth", modified, ReturnsTable::new);

        assert_eq!(loaded, sample_table());
    }

    #[test]
    fn test_newer_ledger_forces_recompute() {
        let dir = tempdir().unwrap();
        let cache = ReturnsCache::new(CacheConfig::new(dir.path()));
        cache.get_or_compute("Growth", Some(Utc::now() - Duration::hours(1)), sample_table);

        let mut fresh = ReturnsTable::new();
        fresh.insert(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), "NVDA", 0.03);
        let expected = fresh.clone();
        let result = cache.get_or_compute("Growth", Some(Utc::now() + Duration::hours(1)), || fresh);

        assert_eq!(result, expected);
    }

    #[test]
    fn test_unknown_modification_time_always_recomputes() {
        let dir = tempdir().unwrap();
        let cache = ReturnsCache::new(CacheConfig::new(dir.path()));
        let calls = Cell::new(0);

        for _ in 0..2 {
            cache.get_or_compute("Growth", None, || {
                calls.set(calls.get() + 1);
                sample_table()
            });
        }

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_empty_result_is_not_cached() {
        let dir = tempdir().unwrap();
        let cache = ReturnsCache::new(CacheConfig::new(dir.path()));

        let result = cache.get_or_compute("Empty", Some(Utc::now()), ReturnsTable::new);

        assert!(result.is_empty());
        assert!(!cache.cache_path("Empty").exists());
    }

    #[test]
    fn test_invalidate_removes_memory_and_file() {
        let dir = tempdir().unwrap();
        let cache = ReturnsCache::new(CacheConfig::new(dir.path()));
        let modified = Some(Utc::now() - Duration::hours(1));
        cache.get_or_compute("A", modified, sample_table);
        cache.get_or_compute("B", modified, sample_table);

        cache.invalidate("A");
        assert!(!cache.cache_path("A").exists());
        assert!(cache.cache_path("B").exists());

        let recomputed = cache.get_or_compute("A", modified, ReturnsTable::new);
        assert!(recomputed.is_empty());

        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        cache.invalidate_all();
        assert!(!cache.cache_path("B").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
