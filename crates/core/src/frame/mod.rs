//! Date-indexed tables shared by the position, returns and attribution modules.

mod daily_frame;

#[cfg(test)]
mod daily_frame_tests;

pub use daily_frame::{slice_series, DailyFrame, DailySeries};
pub(crate) use daily_frame::in_range;

use rust_decimal::Decimal;

/// Held quantity per ticker per calendar day.
pub type PositionTable = DailyFrame<Decimal>;

/// Market-value weight per ticker per calendar day.
pub type WeightTable = DailyFrame<f64>;

/// Daily simple return per ticker per trading day.
pub type ReturnsTable = DailyFrame<f64>;
