//! One pipeline run: resolve window, fetch, derive, load.

use super::ui;
use crate::core::config::AppConfig;
use crate::core::{
    CurrencyCode, EtlError, EurRateSeries, LoadWindow, RateSource, compute_cross_rates,
    resolve_window,
};
use crate::store::Warehouse;
use anyhow::Context;
use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{info, warn};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub window: LoadWindow,
    pub dates_inserted: usize,
    pub observations_fetched: usize,
    pub rates_derived: usize,
    pub rows_loaded: usize,
}

impl RunSummary {
    fn up_to_date() -> Self {
        RunSummary {
            window: LoadWindow::UpToDate,
            dates_inserted: 0,
            observations_fetched: 0,
            rates_derived: 0,
            rows_loaded: 0,
        }
    }
}

/// Fetches every non-EUR currency concurrently and collects the results.
async fn fetch_eur_series(
    source: &dyn RateSource,
    currencies: &[CurrencyCode],
    start: NaiveDate,
    end: NaiveDate,
) -> EurRateSeries {
    let to_fetch: Vec<&CurrencyCode> = currencies.iter().filter(|c| !c.is_eur()).collect();

    let pb = ui::new_progress_bar(to_fetch.len() as u64);
    pb.set_message("Fetching ECB rates");
    let fetches = to_fetch.into_iter().map(|currency| {
        let pb = pb.clone();
        async move {
            let series = source.fetch(currency, start, end).await;
            pb.inc(1);
            (currency.clone(), series)
        }
    });
    let results = join_all(fetches).await;
    pb.finish_and_clear();

    results.into_iter().collect()
}

fn display_fetch_summary(eur_series: &EurRateSeries) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Observations"),
        ui::header_cell("First"),
        ui::header_cell("Last"),
    ]);
    for (currency, series) in eur_series.iter() {
        table.add_row(vec![
            comfy_table::Cell::new(format!("EUR/{currency}")),
            ui::count_cell(series.len()),
            ui::format_optional_cell(series.keys().next(), |d| d.to_string()),
            ui::format_optional_cell(series.keys().next_back(), |d| d.to_string()),
        ]);
    }
    println!("{table}");
}

/// Executes one run against `warehouse` as of `today`.
///
/// Schema creation failures are setup errors; everything after the window
/// is resolved is a run error. Source failures never abort the run.
pub async fn execute(
    config: &AppConfig,
    warehouse: &mut Warehouse,
    source: &dyn RateSource,
    today: NaiveDate,
) -> Result<RunSummary, EtlError> {
    warehouse.setup_schema().map_err(EtlError::Setup)?;

    let persisted_max_date = warehouse.max_loaded_date().map_err(EtlError::Run)?;
    if let Some(latest) = persisted_max_date.filter(|d| *d > today) {
        warn!(%latest, %today, "Warehouse holds dates after today");
    }

    let window = resolve_window(persisted_max_date, today, config.history_start);
    info!(%window, "Resolved load window");
    println!(
        "{} {}",
        ui::style_text("Load window:", ui::StyleType::TotalLabel),
        window
    );

    let Some((start, end)) = window.range() else {
        return Ok(RunSummary::up_to_date());
    };

    let dates_inserted = warehouse
        .populate_date_dimension(start, end)
        .context("Failed to populate date dimension")
        .map_err(EtlError::Run)?;

    let eur_series = fetch_eur_series(source, &config.currencies, start, end).await;
    display_fetch_summary(&eur_series);
    if eur_series.is_empty() {
        println!(
            "{}",
            ui::style_text("No rates available for this window", ui::StyleType::Warning)
        );
    }

    let observations = compute_cross_rates(&eur_series, &config.currencies, &config.source_name);
    let rows_loaded = warehouse
        .upsert_rates(&observations)
        .context("Failed to load rates")
        .map_err(EtlError::Run)?;

    let summary = RunSummary {
        window,
        dates_inserted,
        observations_fetched: eur_series.observation_count(),
        rates_derived: observations.len(),
        rows_loaded,
    };
    println!(
        "{} {} {}",
        ui::style_text("Loaded", ui::StyleType::TotalLabel),
        ui::style_text(&summary.rows_loaded.to_string(), ui::StyleType::TotalValue),
        ui::style_text(
            &format!(
                "currency pair rates ({} derived from {} EUR observations)",
                summary.rates_derived, summary.observations_fetched
            ),
            ui::StyleType::Subtle
        ),
    );
    Ok(summary)
}
