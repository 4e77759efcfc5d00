//! Returns module - daily returns, compounding, resampling and the returns cache.

mod returns_cache;
mod returns_calculator;
mod returns_model;
mod returns_service;

#[cfg(test)]
mod returns_cache_tests;
#[cfg(test)]
mod returns_service_tests;

pub use returns_cache::{read_returns_csv, write_returns_csv, CacheConfig, ReturnsCache};
pub use returns_calculator::*;
pub use returns_model::*;
pub use returns_service::ReturnsDataService;
