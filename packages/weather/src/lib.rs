#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Temperature data from the Open-Meteo forecast API.
//!
//! Provides single-point daily means and hourly series, plus a concurrent
//! fetch over a lattice of points. Every request goes through
//! [`retry::send_json`], which retries rate limiting, server errors and
//! transient connection failures with exponential backoff.
//!
//! See <https://open-meteo.com/en/docs>

pub mod lattice;
pub mod open_meteo;
pub mod retry;

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use thiserror::Error;
use urban_greening_scoring_models::config::WeatherConfig;

/// Errors from the weather client.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body did not have the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// What was missing or malformed.
        message: String,
    },

    /// The requested date range is inverted.
    #[error("Invalid date range: {start} is after {end}")]
    DateRange {
        /// First day.
        start: NaiveDate,
        /// Last day.
        end: NaiveDate,
    },
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::DateRange`] if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WeatherError> {
        if start > end {
            return Err(WeatherError::DateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days leading up to and including `today`.
    #[must_use]
    pub fn ending_on(today: NaiveDate, days: u32) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// The last `days` days, ending today (UTC).
    #[must_use]
    pub fn last_days(days: u32) -> Self {
        Self::ending_on(Utc::now().date_naive(), days)
    }
}

/// Builds an HTTP client with the configured per-request timeout.
///
/// # Errors
///
/// Returns [`WeatherError::Http`] if the TLS backend fails to initialize.
pub fn build_client(config: &WeatherConfig) -> Result<reqwest::Client, WeatherError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("urban_greening/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
