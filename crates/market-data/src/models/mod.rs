//! Market data models
//!
//! - `quote` - Daily OHLCV bars (Quote)
//! - `holding` - ETF constituent data (EtfHolding)
//! - `profile` - Security profile data (AssetProfile)

mod holding;
mod profile;
mod quote;

pub use holding::EtfHolding;
pub use profile::AssetProfile;
pub use quote::Quote;
