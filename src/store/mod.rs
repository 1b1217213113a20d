//! SQLite star-schema warehouse: `dim_date` and `fact_fx_rates`.

use crate::core::RateObservation;
use crate::core::date_dim::date_range;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Single-writer handle on the warehouse database.
pub struct Warehouse {
    conn: Connection,
}

impl Warehouse {
    /// Opens (or creates) the database file, creating its directory if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        debug!("Opened warehouse at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    /// The bundled SQLite enforces foreign keys by default. `fact_fx_rates.date`
    /// is declared against `dim_date` but not enforced, so a rate dated outside
    /// the populated dimension still loads.
    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", false)
            .context("Failed to disable foreign key enforcement")?;
        Ok(Self { conn })
    }

    /// Creates both tables if they do not exist yet.
    pub fn setup_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS dim_date (
                    date TEXT PRIMARY KEY,
                    year INTEGER NOT NULL,
                    month INTEGER NOT NULL,
                    day INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS fact_fx_rates (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    base_currency TEXT NOT NULL,
                    quote_currency TEXT NOT NULL,
                    rate REAL NOT NULL,
                    source TEXT NOT NULL,
                    loaded_at TEXT DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY (date) REFERENCES dim_date(date),
                    UNIQUE(date, base_currency, quote_currency)
                );",
            )
            .context("Failed to create warehouse schema")?;
        debug!("Warehouse schema ready");
        Ok(())
    }

    fn fact_table_exists(&self) -> Result<bool> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'fact_fx_rates'",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to inspect schema")?;
        Ok(name.is_some())
    }

    /// Latest date present in the fact table; `None` if the table is missing
    /// or empty.
    pub fn max_loaded_date(&self) -> Result<Option<NaiveDate>> {
        if !self.fact_table_exists()? {
            return Ok(None);
        }
        let max: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM fact_fx_rates", [], |row| row.get(0))
            .context("Failed to query latest loaded date")?;

        max.map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .with_context(|| format!("Invalid date in fact_fx_rates: {s}"))
        })
        .transpose()
    }

    /// Upserts all observations in one transaction, replacing rows with the
    /// same (date, base, quote). Returns the number of rows written.
    pub fn upsert_rates(&mut self, observations: &[RateObservation]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to start load transaction")?;
        let mut written = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO fact_fx_rates (date, base_currency, quote_currency, rate, source)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(date, base_currency, quote_currency) DO UPDATE SET
                        rate = excluded.rate,
                        source = excluded.source,
                        loaded_at = CURRENT_TIMESTAMP",
                )
                .context("Failed to prepare rate upsert")?;

            for obs in observations {
                written += stmt
                    .execute(params![
                        obs.date().format(DATE_FORMAT).to_string(),
                        obs.base_currency().as_str(),
                        obs.quote_currency().as_str(),
                        obs.rate().value(),
                        obs.source(),
                    ])
                    .with_context(|| {
                        format!(
                            "Failed to write {}/{} for {}",
                            obs.base_currency(),
                            obs.quote_currency(),
                            obs.date()
                        )
                    })?;
            }
        }
        tx.commit().context("Failed to commit rates")?;

        info!(rows = written, "Loaded rates into warehouse");
        Ok(written)
    }

    /// Inserts one `dim_date` row per day in `start..=end`, skipping dates
    /// already present. Returns the number of new rows.
    pub fn populate_date_dimension(&mut self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        let rows = date_range(start, end);
        let tx = self
            .conn
            .transaction()
            .context("Failed to start date dimension transaction")?;
        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO dim_date (date, year, month, day) VALUES (?1, ?2, ?3, ?4)",
                )
                .context("Failed to prepare date dimension insert")?;
            for row in &rows {
                inserted += stmt
                    .execute(params![
                        row.date.format(DATE_FORMAT).to_string(),
                        row.year,
                        row.month,
                        row.day
                    ])
                    .with_context(|| format!("Failed to insert date {}", row.date))?;
            }
        }
        tx.commit().context("Failed to commit date dimension")?;

        debug!(
            days = rows.len(),
            inserted, "Populated date dimension from {} to {}", start, end
        );
        Ok(inserted)
    }

    pub fn count_rates(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM fact_fx_rates", [], |row| row.get(0))
            .context("Failed to count rates")?;
        Ok(count as usize)
    }

    pub fn count_dates(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dim_date", [], |row| row.get(0))
            .context("Failed to count dates")?;
        Ok(count as usize)
    }

    /// Stored rate for one pair on one date.
    pub fn get_rate(&self, date: NaiveDate, base: &str, quote: &str) -> Result<Option<f64>> {
        self.conn
            .query_row(
                "SELECT rate FROM fact_fx_rates
                 WHERE date = ?1 AND base_currency = ?2 AND quote_currency = ?3",
                params![date.format(DATE_FORMAT).to_string(), base, quote],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query rate")
    }
}
