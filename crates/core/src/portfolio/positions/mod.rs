//! Position reconstruction from the transaction ledger and daily market-value weights.

mod position_calculator;
mod position_history_service;
mod weights_calculator;


pub use position_calculator::reconstruct_positions;
pub use position_history_service::PositionHistoryService;
pub use weights_calculator::compute_daily_weights;
