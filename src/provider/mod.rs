//! Stock data provider module
//!
//! REST pass-through to TwelveData for profile and symbol search lookups.

mod twelvedata;

pub use twelvedata::{ProviderConfig, ProviderError, TwelveDataClient};
