use chrono::NaiveDate;
use quantterm_market_data::{AssetProfile, EtfHolding};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::AddAssign;

use crate::frame::{ReturnsTable, WeightTable};

/// The three Brinson-Fachler effects for one security, sector, day or period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrinsonEffects {
    pub allocation: f64,
    pub selection: f64,
    pub interaction: f64,
}

impl BrinsonEffects {
    /// Brinson-Fachler (1985):
    /// allocation `(w_p - w_b)(r_b_sector - r_b_total)`,
    /// selection `w_b (r_p - r_b)`,
    /// interaction `(w_p - w_b)(r_p - r_b)`.
    pub fn compute(
        exposure: &Exposure,
        sector_benchmark_return: f64,
        total_benchmark_return: f64,
    ) -> Self {
        let active_weight = exposure.portfolio_weight - exposure.benchmark_weight;
        let active_return = exposure.portfolio_return - exposure.benchmark_return;
        Self {
            allocation: active_weight * (sector_benchmark_return - total_benchmark_return),
            selection: exposure.benchmark_weight * active_return,
            interaction: active_weight * active_return,
        }
    }

    pub fn total(&self) -> f64 {
        self.allocation + self.selection + self.interaction
    }
}

impl AddAssign for BrinsonEffects {
    fn add_assign(&mut self, other: Self) {
        self.allocation += other.allocation;
        self.selection += other.selection;
        self.interaction += other.interaction;
    }
}

/// Weights and period returns of one security on both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exposure {
    pub portfolio_weight: f64,
    pub benchmark_weight: f64,
    pub portfolio_return: f64,
    pub benchmark_return: f64,
}

/// Display classification of a security.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub name: String,
    pub sector: String,
    pub industry: String,
}

/// Attribution of one security, or one sector when aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionResult {
    /// Ticker, or the sector name for sector rows.
    pub key: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub portfolio_weight: f64,
    pub benchmark_weight: f64,
    pub portfolio_return: f64,
    pub benchmark_return: f64,
    pub allocation_effect: f64,
    pub selection_effect: f64,
    pub interaction_effect: f64,
    pub total_effect: f64,
}

impl AttributionResult {
    /// `total_effect` is always derived from the three effects.
    pub fn new(
        key: impl Into<String>,
        classification: Classification,
        exposure: Exposure,
        effects: BrinsonEffects,
    ) -> Self {
        Self {
            key: key.into(),
            name: classification.name,
            sector: classification.sector,
            industry: classification.industry,
            portfolio_weight: exposure.portfolio_weight,
            benchmark_weight: exposure.benchmark_weight,
            portfolio_return: exposure.portfolio_return,
            benchmark_return: exposure.benchmark_return,
            allocation_effect: effects.allocation,
            selection_effect: effects.selection,
            interaction_effect: effects.interaction,
            total_effect: effects.total(),
        }
    }

    pub fn effects(&self) -> BrinsonEffects {
        BrinsonEffects {
            allocation: self.allocation_effect,
            selection: self.selection_effect,
            interaction: self.interaction_effect,
        }
    }
}

/// Summed effects across all securities on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttributionEffect {
    pub date: NaiveDate,
    pub allocation: f64,
    pub selection: f64,
    pub interaction: f64,
}

impl DailyAttributionEffect {
    pub fn effects(&self) -> BrinsonEffects {
        BrinsonEffects {
            allocation: self.allocation,
            selection: self.selection,
            interaction: self.interaction,
        }
    }
}

/// One complete attribution run.
///
/// Without daily weights the totals are the sums of `by_security`. With daily
/// weights the totals are the sums of `daily_effects` and are computed
/// independently of `by_security`, so the two can differ; see
/// [`BrinsonAnalysis::security_level_divergence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrinsonAnalysis {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_portfolio_return: f64,
    pub total_benchmark_return: f64,
    pub total_excess_return: f64,
    pub total_allocation_effect: f64,
    pub total_selection_effect: f64,
    pub total_interaction_effect: f64,
    pub by_security: BTreeMap<String, AttributionResult>,
    pub by_sector: BTreeMap<String, AttributionResult>,
    /// Empty unless daily portfolio weights were supplied.
    #[serde(default)]
    pub daily_effects: Vec<DailyAttributionEffect>,
    #[serde(default)]
    pub used_time_varying_benchmark: bool,
}

impl BrinsonAnalysis {
    pub fn total_effects(&self) -> BrinsonEffects {
        BrinsonEffects {
            allocation: self.total_allocation_effect,
            selection: self.total_selection_effect,
            interaction: self.total_interaction_effect,
        }
    }

    pub fn is_daily(&self) -> bool {
        !self.daily_effects.is_empty()
    }

    /// Period totals minus the sum of the security-level effects. Zero in
    /// static mode up to summation order.
    pub fn security_level_divergence(&self) -> BrinsonEffects {
        let mut summed = BrinsonEffects::default();
        for result in self.by_security.values() {
            summed += result.effects();
        }
        let totals = self.total_effects();
        BrinsonEffects {
            allocation: totals.allocation - summed.allocation,
            selection: totals.selection - summed.selection,
            interaction: totals.interaction - summed.interaction,
        }
    }
}

/// Everything the attribution engine reads.
///
/// `daily_weights` switches on daily mode. `daily_benchmark_weights` replaces
/// the static benchmark weight per day where it has a column for a ticker.
/// `security_profiles` and `sector_overrides` classify tickers that are not
/// benchmark constituents.
#[derive(Debug, Clone, Copy)]
pub struct AttributionInput<'a> {
    pub portfolio_weights: &'a HashMap<String, f64>,
    pub benchmark_holdings: &'a HashMap<String, EtfHolding>,
    pub portfolio_returns: &'a ReturnsTable,
    pub benchmark_returns: &'a ReturnsTable,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub daily_weights: Option<&'a WeightTable>,
    pub daily_benchmark_weights: Option<&'a WeightTable>,
    pub security_profiles: &'a HashMap<String, AssetProfile>,
    pub sector_overrides: &'a HashMap<String, String>,
}
