use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDimensionRow {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for DateDimensionRow {
    fn from(date: NaiveDate) -> Self {
        DateDimensionRow {
            date,
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// One row per calendar date in `start..=end`; empty when `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<DateDimensionRow> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(DateDimensionRow::from)
        .collect()
}
