//! Rate source abstraction

use super::currency::CurrencyCode;
use super::rate::DateSeries;
use async_trait::async_trait;
use chrono::NaiveDate;

/// A provider of EUR-quoted daily rates.
///
/// `fetch` never fails: network, HTTP and parsing problems are logged by the
/// implementation and surface as an empty (or partial) series. Callers treat
/// an empty series as "no data available", not as an error.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(
        &self,
        currency: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DateSeries;
}
