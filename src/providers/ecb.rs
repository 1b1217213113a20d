//! EUR reference rates from the ECB Data Portal (SDMX-JSON).

use super::util::with_retry;
use crate::core::config::EcbProviderConfig;
use crate::core::{CurrencyCode, DateSeries, Rate, RateSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct EcbResponse {
    #[serde(rename = "dataSets", default)]
    data_sets: Vec<DataSet>,
    structure: Structure,
}

#[derive(Debug, Deserialize)]
struct DataSet {
    #[serde(default)]
    series: BTreeMap<String, Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    observations: HashMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct Structure {
    dimensions: Dimensions,
}

#[derive(Debug, Deserialize)]
struct Dimensions {
    #[serde(default)]
    observation: Vec<Dimension>,
}

#[derive(Debug, Deserialize)]
struct Dimension {
    #[serde(default)]
    values: Vec<DimensionValue>,
}

#[derive(Debug, Deserialize)]
struct DimensionValue {
    id: String,
}

/// Extracts the daily series from an SDMX-JSON payload.
///
/// Observations are keyed by an index into the time dimension. Entries with a
/// missing or invalid value, an unknown index or an unparsable date are
/// skipped.
fn parse_series(currency: &CurrencyCode, body: &str) -> Result<DateSeries> {
    let response: EcbResponse = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse ECB response for {currency}"))?;

    let mut series = DateSeries::new();
    let Some(observations) = response
        .data_sets
        .first()
        .and_then(|ds| ds.series.values().next())
        .map(|s| &s.observations)
    else {
        debug!(%currency, "ECB response contains no series");
        return Ok(series);
    };

    let time_periods = response
        .structure
        .dimensions
        .observation
        .first()
        .map(|d| d.values.as_slice())
        .ok_or_else(|| anyhow!("ECB response for {currency} has no time dimension"))?;

    for (index, values) in observations {
        let Some(period) = index
            .parse::<usize>()
            .ok()
            .and_then(|i| time_periods.get(i))
        else {
            warn!(%currency, index = %index, "Unknown time period index");
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(&period.id, "%Y-%m-%d") else {
            warn!(%currency, period = %period.id, "Unparsable time period");
            continue;
        };
        let rate = values
            .first()
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| anyhow!("missing value"))
            .and_then(Rate::new);
        match rate {
            Ok(rate) => {
                series.insert(date, rate);
            }
            Err(e) => warn!(%currency, %date, error = %e, "Skipping invalid observation"),
        }
    }

    Ok(series)
}

pub struct EcbRateSource {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
    retry_delay_ms: u64,
}

impl EcbRateSource {
    pub fn new(config: &EcbProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxdwh/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(EcbRateSource {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            retries: config.retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    fn series_url(&self, currency: &CurrencyCode, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/service/data/EXR/D.{}.EUR.SP00.A?startPeriod={}&endPeriod={}&format=jsondata",
            self.base_url, currency, start, end
        )
    }

    async fn try_fetch(
        &self,
        currency: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateSeries> {
        let url = self.series_url(currency, start, end);
        debug!("Requesting rates from {}", url);

        let response = with_retry(
            || async { self.client.get(&url).send().await?.error_for_status() },
            self.retries,
            self.retry_delay_ms,
        )
        .await;

        let response = match response {
            Ok(response) => response,
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                debug!(%currency, "No observations in window");
                return Ok(DateSeries::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Request failed for {currency}"));
            }
        };

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for {currency}"))?;
        if body.trim().is_empty() {
            return Ok(DateSeries::new());
        }

        parse_series(currency, &body)
    }
}

#[async_trait]
impl RateSource for EcbRateSource {
    #[instrument(name = "EcbFetch", skip(self), fields(currency = %currency))]
    async fn fetch(
        &self,
        currency: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DateSeries {
        if currency.is_eur() {
            return DateSeries::new();
        }

        match self.try_fetch(currency, start, end).await {
            Ok(series) => {
                debug!(count = series.len(), "Fetched rates");
                series
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Fetch failed, continuing without data");
                DateSeries::new()
            }
        }
    }
}
