//! Core business logic: rate types, window resolution and cross rate derivation

pub mod config;
pub mod cross;
pub mod currency;
pub mod date_dim;
pub mod error;
pub mod log;
pub mod rate;
pub mod source;
pub mod window;

// Re-export main types for cleaner imports
pub use cross::compute_cross_rates;
pub use currency::CurrencyCode;
pub use error::EtlError;
pub use rate::{DateSeries, EurRateSeries, Rate, RateObservation};
pub use source::RateSource;
pub use window::{LoadWindow, resolve_window};
