//! Derives every pairwise cross rate from EUR-quoted series.

use super::currency::CurrencyCode;
use super::rate::{EurRateSeries, Rate, RateObservation};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Derives the rate for `base`/`quote` from one date's EUR snapshot.
///
/// Returns `None` when neither side is EUR and at least one side has no
/// observation on that date.
fn derive_rate(
    snapshot: &HashMap<&CurrencyCode, Rate>,
    base: &CurrencyCode,
    quote: &CurrencyCode,
) -> Option<f64> {
    if base.is_eur() {
        return snapshot.get(quote).map(Rate::value);
    }
    if quote.is_eur() {
        return snapshot.get(base).map(|r| 1.0 / r.value());
    }
    match (snapshot.get(base), snapshot.get(quote)) {
        (Some(b), Some(q)) => Some(q.value() / b.value()),
        _ => None,
    }
}

/// Computes all ordered currency pair rates for every date in `eur_series`.
///
/// Output is ordered by date, then by the position of base and quote in
/// `currencies`. Pairs with base == quote are never emitted.
pub fn compute_cross_rates(
    eur_series: &EurRateSeries,
    currencies: &[CurrencyCode],
    source: &str,
) -> Vec<RateObservation> {
    let dates: BTreeSet<NaiveDate> = eur_series
        .iter()
        .flat_map(|(_, series)| series.keys().copied())
        .collect();

    let mut observations = Vec::new();
    for date in dates {
        let snapshot: HashMap<&CurrencyCode, Rate> = eur_series
            .iter()
            .filter_map(|(currency, series)| series.get(&date).map(|rate| (currency, *rate)))
            .collect();

        for base in currencies {
            for quote in currencies {
                if base == quote {
                    continue;
                }
                let Some(value) = derive_rate(&snapshot, base, quote) else {
                    continue;
                };
                let observation = Rate::new(value).and_then(|rate| {
                    RateObservation::new(date, base.clone(), quote.clone(), rate, source)
                });
                match observation {
                    Ok(observation) => observations.push(observation),
                    Err(e) => warn!(%date, %base, %quote, error = %e, "Rejected derived rate"),
                }
            }
        }
    }

    debug!(count = observations.len(), "Calculated currency pair rates");
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::DateSeries;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ccy(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn series(points: &[(&str, f64)]) -> DateSeries {
        points
            .iter()
            .map(|(d, r)| (date(d), Rate::new(*r).unwrap()))
            .collect()
    }

    fn rate_of(obs: &[RateObservation], d: &str, base: &str, quote: &str) -> Option<f64> {
        obs.iter()
            .find(|o| {
                o.date() == date(d)
                    && o.base_currency().as_str() == base
                    && o.quote_currency().as_str() == quote
            })
            .map(|o| o.rate().value())
    }

    fn assert_close(a: f64, b: f64) {
        assert!(
            ((a - b) / b).abs() < 1e-9,
            "expected {a} to be within 1e-9 of {b}"
        );
    }

    #[test]
    fn test_two_currency_snapshot_emits_six_pairs() {
        let eur_series: EurRateSeries = [
            (ccy("NOK"), series(&[("2025-01-01", 11.5)])),
            (ccy("SEK"), series(&[("2025-01-01", 12.0)])),
        ]
        .into_iter()
        .collect();
        let currencies = [ccy("EUR"), ccy("NOK"), ccy("SEK")];

        let obs = compute_cross_rates(&eur_series, &currencies, "ECB");

        assert_eq!(obs.len(), 6);
        assert!(obs.iter().all(|o| o.source() == "ECB"));
        assert!(obs.iter().all(|o| o.date() == date("2025-01-01")));
        assert_eq!(rate_of(&obs, "2025-01-01", "EUR", "NOK"), Some(11.5));
        assert_eq!(rate_of(&obs, "2025-01-01", "NOK", "EUR"), Some(1.0 / 11.5));
        assert_eq!(rate_of(&obs, "2025-01-01", "EUR", "SEK"), Some(12.0));
        assert_eq!(rate_of(&obs, "2025-01-01", "SEK", "EUR"), Some(1.0 / 12.0));
        assert_eq!(rate_of(&obs, "2025-01-01", "NOK", "SEK"), Some(12.0 / 11.5));
        assert_eq!(rate_of(&obs, "2025-01-01", "SEK", "NOK"), Some(11.5 / 12.0));
    }

    #[test]
    fn test_output_follows_date_then_currency_order() {
        let eur_series: EurRateSeries = [
            (ccy("NOK"), series(&[("2025-01-02", 11.6), ("2025-01-01", 11.5)])),
            (ccy("SEK"), series(&[("2025-01-01", 12.0)])),
        ]
        .into_iter()
        .collect();
        let currencies = [ccy("NOK"), ccy("EUR"), ccy("SEK")];

        let obs = compute_cross_rates(&eur_series, &currencies, "ECB");
        let keys: Vec<(String, String, String)> = obs
            .iter()
            .map(|o| {
                (
                    o.date().to_string(),
                    o.base_currency().to_string(),
                    o.quote_currency().to_string(),
                )
            })
            .collect();

        let expected = [
            ("2025-01-01", "NOK", "EUR"),
            ("2025-01-01", "NOK", "SEK"),
            ("2025-01-01", "EUR", "NOK"),
            ("2025-01-01", "EUR", "SEK"),
            ("2025-01-01", "SEK", "NOK"),
            ("2025-01-01", "SEK", "EUR"),
            ("2025-01-02", "NOK", "EUR"),
            ("2025-01-02", "EUR", "NOK"),
        ];
        let expected: Vec<(String, String, String)> = expected
            .iter()
            .map(|(d, b, q)| (d.to_string(), b.to_string(), q.to_string()))
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_inverse_and_triangulation_hold() {
        let eur_series: EurRateSeries = [
            (ccy("NOK"), series(&[("2025-02-03", 11.7321)])),
            (ccy("SEK"), series(&[("2025-02-03", 11.4755)])),
            (ccy("PLN"), series(&[("2025-02-03", 4.2153)])),
            (ccy("CZK"), series(&[("2025-02-03", 25.166)])),
        ]
        .into_iter()
        .collect();
        let currencies = [ccy("EUR"), ccy("NOK"), ccy("SEK"), ccy("PLN"), ccy("CZK")];
        let d = "2025-02-03";

        let obs = compute_cross_rates(&eur_series, &currencies, "ECB");
        assert_eq!(obs.len(), 5 * 4);

        for a in &currencies {
            for b in &currencies {
                if a == b {
                    continue;
                }
                let ab = rate_of(&obs, d, a.as_str(), b.as_str()).unwrap();
                let ba = rate_of(&obs, d, b.as_str(), a.as_str()).unwrap();
                assert_close(ab * ba, 1.0);

                for c in &currencies {
                    if c == a || c == b {
                        continue;
                    }
                    let bc = rate_of(&obs, d, b.as_str(), c.as_str()).unwrap();
                    let ac = rate_of(&obs, d, a.as_str(), c.as_str()).unwrap();
                    assert_close(ab * bc, ac);
                }
            }
        }
    }

    #[test]
    fn test_missing_snapshot_entries_leave_gaps() {
        // SEK has no observation on the 2nd, DKK is configured but never fetched
        let eur_series: EurRateSeries = [
            (ccy("NOK"), series(&[("2025-01-01", 11.5), ("2025-01-02", 11.6)])),
            (ccy("SEK"), series(&[("2025-01-01", 12.0)])),
        ]
        .into_iter()
        .collect();
        let currencies = [ccy("EUR"), ccy("NOK"), ccy("SEK"), ccy("DKK")];

        let obs = compute_cross_rates(&eur_series, &currencies, "ECB");

        let day_one = obs.iter().filter(|o| o.date() == date("2025-01-01")).count();
        let day_two = obs.iter().filter(|o| o.date() == date("2025-01-02")).count();
        assert_eq!(day_one, 6);
        assert_eq!(day_two, 2);
        assert!(rate_of(&obs, "2025-01-02", "NOK", "SEK").is_none());
        assert!(rate_of(&obs, "2025-01-02", "SEK", "EUR").is_none());
        assert!(
            obs.iter()
                .all(|o| o.base_currency().as_str() != "DKK" && o.quote_currency().as_str() != "DKK")
        );
    }

    #[test]
    fn test_completeness_matches_derivation_cases() {
        let eur_series: EurRateSeries = [
            (ccy("NOK"), series(&[("2025-01-01", 11.5)])),
            (ccy("PLN"), series(&[("2025-01-02", 4.3)])),
        ]
        .into_iter()
        .collect();
        let currencies = [ccy("EUR"), ccy("NOK"), ccy("PLN")];
        let obs = compute_cross_rates(&eur_series, &currencies, "ECB");

        for d in ["2025-01-01", "2025-01-02"] {
            let present: Vec<&CurrencyCode> = currencies
                .iter()
                .filter(|c| {
                    eur_series
                        .get(c)
                        .is_some_and(|s| s.contains_key(&date(d)))
                })
                .collect();
            for base in &currencies {
                for quote in &currencies {
                    if base == quote {
                        continue;
                    }
                    let derivable = (base.is_eur() && present.contains(&quote))
                        || (quote.is_eur() && present.contains(&base))
                        || (present.contains(&base) && present.contains(&quote));
                    assert_eq!(
                        rate_of(&obs, d, base.as_str(), quote.as_str()).is_some(),
                        derivable,
                        "{d} {base}/{quote}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let currencies = [ccy("EUR"), ccy("NOK")];
        assert!(compute_cross_rates(&EurRateSeries::new(), &currencies, "ECB").is_empty());

        let empty_series: EurRateSeries = [(ccy("NOK"), DateSeries::new())].into_iter().collect();
        assert!(compute_cross_rates(&empty_series, &currencies, "ECB").is_empty());
    }

    #[test]
    fn test_overflowing_cross_rate_is_rejected() {
        let eur_series: EurRateSeries = [
            (ccy("AAA"), series(&[("2025-01-01", 1e-300)])),
            (ccy("BBB"), series(&[("2025-01-01", 1e300)])),
        ]
        .into_iter()
        .collect();
        let currencies = [ccy("AAA"), ccy("BBB")];

        let obs = compute_cross_rates(&eur_series, &currencies, "ECB");

        // AAA/BBB = 1e600 overflows, BBB/AAA = 1e-600 underflows to zero
        assert!(obs.is_empty());
    }
}
