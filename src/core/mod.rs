//! Core domain: treasury records, the normalization/aggregation engine and the
//! abstractions for its data sources.

pub mod asset;
pub mod cache;
pub mod config;
pub mod currency;
pub mod format;
pub mod holding;
pub mod log;
pub mod merge;
pub mod metrics;
pub mod normalize;
pub mod report;
pub mod stats;
pub mod treasury;

// Re-export main types for cleaner imports
pub use asset::Asset;
pub use currency::{Currency, FxRateProvider, FxRateTable};
pub use normalize::TreasuryPayload;
pub use treasury::TreasuryProvider;
