//! Decides which date range a run has to load.

use chrono::{Days, NaiveDate};
use std::fmt::Display;

/// The date range a run loads, or `UpToDate` when there is nothing to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadWindow {
    Full { start: NaiveDate, end: NaiveDate },
    Incremental { start: NaiveDate, end: NaiveDate },
    UpToDate,
}

impl LoadWindow {
    /// Inclusive `(start, end)` of the window, `None` when no load is needed.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            LoadWindow::Full { start, end } | LoadWindow::Incremental { start, end } => {
                Some((start, end))
            }
            LoadWindow::UpToDate => None,
        }
    }

    pub fn is_full_load(&self) -> bool {
        matches!(self, LoadWindow::Full { .. })
    }
}

impl Display for LoadWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadWindow::Full { start, end } => write!(f, "full load {start} to {end}"),
            LoadWindow::Incremental { start, end } if start == end => {
                write!(f, "incremental load {start}")
            }
            LoadWindow::Incremental { start, end } => {
                write!(f, "incremental load {start} to {end}")
            }
            LoadWindow::UpToDate => write!(f, "up to date, no load needed"),
        }
    }
}

/// Resolves the load window from the latest persisted date.
///
/// A `persisted_max_date` after `today` is reported as up to date rather than
/// treated as an error.
pub fn resolve_window(
    persisted_max_date: Option<NaiveDate>,
    today: NaiveDate,
    history_start: NaiveDate,
) -> LoadWindow {
    let Some(latest) = persisted_max_date else {
        return LoadWindow::Full {
            start: history_start,
            end: today,
        };
    };

    if latest >= today {
        return LoadWindow::UpToDate;
    }

    // latest < today, so the successor always exists and is <= today
    let start = latest.checked_add_days(Days::new(1)).unwrap_or(today);
    LoadWindow::Incremental { start, end: today }
}
