//! CLI subcommand implementations.

pub mod extract;
pub mod generate;
pub mod load;
pub mod run;
pub mod validate;

use chrono::{Local, NaiveDate};

/// The run date to use when `--date` is omitted: today, local time.
pub fn resolve_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
