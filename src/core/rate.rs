//! Rate types shared by the source client, the calculator and the warehouse

use super::currency::CurrencyCode;
use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::debug;

/// A strictly positive, finite exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Rate(f64);

impl Rate {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Rate(value))
        } else {
            Err(anyhow!("Invalid rate: {}", value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1 unit of `base_currency` = `rate` units of `quote_currency` on `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateObservation {
    date: NaiveDate,
    base_currency: CurrencyCode,
    quote_currency: CurrencyCode,
    rate: Rate,
    source: String,
}

impl RateObservation {
    /// Fails when base and quote are the same currency.
    pub fn new(
        date: NaiveDate,
        base_currency: CurrencyCode,
        quote_currency: CurrencyCode,
        rate: Rate,
        source: impl Into<String>,
    ) -> Result<Self> {
        if base_currency == quote_currency {
            bail!("Base and quote currency are both {base_currency} on {date}");
        }
        Ok(RateObservation {
            date,
            base_currency,
            quote_currency,
            rate,
            source: source.into(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    pub fn quote_currency(&self) -> &CurrencyCode {
        &self.quote_currency
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Rates for a single currency, ordered by date.
pub type DateSeries = BTreeMap<NaiveDate, Rate>;

/// EUR-quoted series per currency, as fetched from the source.
///
/// EUR itself never has a series: any attempt to insert one is dropped.
#[derive(Debug, Clone, Default)]
pub struct EurRateSeries {
    series: BTreeMap<CurrencyCode, DateSeries>,
}

impl EurRateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, currency: CurrencyCode, series: DateSeries) {
        if currency.is_eur() {
            debug!("Ignoring EUR/EUR series");
            return;
        }
        self.series.insert(currency, series);
    }

    pub fn get(&self, currency: &CurrencyCode) -> Option<&DateSeries> {
        self.series.get(currency)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, &DateSeries)> {
        self.series.iter()
    }

    /// Total number of observations across all currencies.
    pub fn observation_count(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.observation_count() == 0
    }
}

impl FromIterator<(CurrencyCode, DateSeries)> for EurRateSeries {
    fn from_iter<I: IntoIterator<Item = (CurrencyCode, DateSeries)>>(iter: I) -> Self {
        let mut eur_series = EurRateSeries::new();
        for (currency, series) in iter {
            eur_series.insert(currency, series);
        }
        eur_series
    }
}
