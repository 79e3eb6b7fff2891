//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod fund;
pub mod holdings;
pub mod log;
pub mod period;
pub mod quote;
pub mod store;

// Re-export main types for cleaner imports
pub use fund::{Fund, Holding, PortfolioSummary};
pub use holdings::{FundHoldings, HoldingsProvider};
pub use period::DisclosurePeriod;
pub use quote::{Market, Quote, QuoteProvider};
pub use store::FundStore;
