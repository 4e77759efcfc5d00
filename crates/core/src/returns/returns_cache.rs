//! Read-through cache of per-portfolio daily returns.
//!
//! Entries live in memory and in one CSV file per portfolio. An entry is
//! valid only while it is newer than the portfolio ledger's modification
//! time; an unknown modification time always forces a recompute.

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::errors::{Error, Result};
use crate::frame::ReturnsTable;
use crate::utils::time_utils::{parse_date, DATE_FORMAT};

const CACHE_FILE_SUFFIX: &str = "_returns.csv";
const DATE_COLUMN: &str = "date";

/// Where cache files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
}

impl CacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }
}

impl Default for CacheConfig {
    /// `$HOME/.quant_terminal/cache/returns`, or a relative path when no home
    /// directory is known.
    fn default() -> Self {
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(".quant_terminal").join("cache").join("returns"))
    }
}

#[derive(Debug, Clone)]
struct CachedReturns {
    table: ReturnsTable,
    computed_at: DateTime<Utc>,
}

/// Memory plus disk cache keyed by portfolio name.
///
/// One mutex serializes read-check-compute-write so concurrent callers do not
/// compute the same portfolio twice.
#[derive(Debug)]
pub struct ReturnsCache {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CachedReturns>>,
}

impl ReturnsCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cache file for a portfolio. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn cache_path(&self, portfolio_name: &str) -> PathBuf {
        let safe_name: String = portfolio_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.config
            .cache_dir
            .join(format!("{}{}", safe_name, CACHE_FILE_SUFFIX))
    }

    /// Cached returns for `portfolio_name`, computing and storing them when
    /// no valid entry exists. Empty computations are returned but not stored.
    pub fn get_or_compute<F>(
        &self,
        portfolio_name: &str,
        ledger_modified: Option<DateTime<Utc>>,
        compute: F,
    ) -> ReturnsTable
    where
        F: FnOnce() -> ReturnsTable,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(portfolio_name) {
            if is_fresh(entry.computed_at, ledger_modified) {
                debug!("Returns cache hit (memory) for '{}'", portfolio_name);
                return entry.table.clone();
            }
        }

        let path = self.cache_path(portfolio_name);
        if let Some(file_time) = file_modified_time(&path) {
            if is_fresh(file_time, ledger_modified) {
                match read_returns_csv(&path) {
                    Ok(table) => {
                        debug!("Returns cache hit (disk) for '{}'", portfolio_name);
                        entries.insert(
                            portfolio_name.to_string(),
                            CachedReturns {
                                table: table.clone(),
                                computed_at: file_time,
                            },
                        );
                        return table;
                    }
                    Err(e) => warn!(
                        "Ignoring unreadable returns cache {}: {}",
                        path.display(),
                        e
                    ),
                }
            }
        }

        let table = compute();
        if table.is_empty() {
            return table;
        }

        if let Err(e) = self.write_file(&path, &table) {
            warn!("Could not cache returns for '{}': {}", portfolio_name, e);
        }
        entries.insert(
            portfolio_name.to_string(),
            CachedReturns {
                table: table.clone(),
                computed_at: Utc::now(),
            },
        );
        table
    }

    /// Drop the memory entry and cache file for one portfolio.
    pub fn invalidate(&self, portfolio_name: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(portfolio_name);
        remove_file_if_exists(&self.cache_path(portfolio_name));
    }

    /// Drop every memory entry and every cache file in the cache directory.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();

        let dir = match fs::read_dir(&self.config.cache_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(
                    "Could not list returns cache {}: {}",
                    self.config.cache_dir.display(),
                    e
                );
                return;
            }
        };
        for entry in dir.flatten() {
            let path = entry.path();
            let is_cache_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(CACHE_FILE_SUFFIX));
            if is_cache_file {
                remove_file_if_exists(&path);
            }
        }
    }

    fn write_file(&self, path: &Path, table: &ReturnsTable) -> Result<()> {
        fs::create_dir_all(&self.config.cache_dir)?;
        let tmp_path = path.with_extension("csv.tmp");
        write_returns_csv(&tmp_path, table)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

fn is_fresh(cached_at: DateTime<Utc>, ledger_modified: Option<DateTime<Utc>>) -> bool {
    ledger_modified.is_some_and(|modified| cached_at > modified)
}

fn file_modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

fn remove_file_if_exists(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove returns cache {}: {}", path.display(), e);
        }
    }
}

/// Write a returns table as CSV: a `date` column followed by one column per
/// ticker. Missing cells are left empty.
pub fn write_returns_csv(path: &Path, table: &ReturnsTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let tickers: Vec<&str> = table.columns().collect();

    let mut header = Vec::with_capacity(tickers.len() + 1);
    header.push(DATE_COLUMN);
    header.extend(tickers.iter().copied());
    writer.write_record(&header)?;

    for (date, row) in table.rows() {
        let mut record = Vec::with_capacity(tickers.len() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        for ticker in &tickers {
            record.push(
                row.get(*ticker)
                    .filter(|v| v.is_finite())
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a table written by [`write_returns_csv`].
pub fn read_returns_csv(path: &Path) -> Result<ReturnsTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.get(0) != Some(DATE_COLUMN) {
        return Err(Error::Cache(format!(
            "{} does not start with a '{}' column",
            path.display(),
            DATE_COLUMN
        )));
    }
    let tickers: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut table = ReturnsTable::with_columns(tickers.iter().cloned());
    for record in reader.records() {
        let record = record?;
        let date: NaiveDate = parse_date(record.get(0).unwrap_or_default())?;
        table.ensure_row(date);
        for (ticker, cell) in tickers.iter().zip(record.iter().skip(1)) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            table.insert(date, ticker, cell.parse::<f64>()?);
        }
    }
    Ok(table)
}
