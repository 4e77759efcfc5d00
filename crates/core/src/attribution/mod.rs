//! Attribution module - Brinson-Fachler decomposition of excess return and
//! the end-to-end analysis run.

mod attribution_model;
mod attribution_service;
mod brinson;


pub use attribution_model::*;
pub use attribution_service::{AnalysisOutcome, AnalysisReport, AttributionService};
pub use brinson::{aggregate_by_sector, calculate_attribution, period_returns};
