//! Shared configuration defaults.

use chrono::{Days, NaiveDate, Utc};
use std::time::Duration;

/// How far back the default since-date cutoff reaches.
const DEFAULT_BACKLOG_DAYS: u64 = 30;

/// HTTP client configuration for the metadata source.
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Default since-date: 30 days before run time.
pub fn default_from_date() -> NaiveDate {
    Utc::now().date_naive() - Days::new(DEFAULT_BACKLOG_DAYS)
}
