//! Open-Meteo forecast endpoint.
//!
//! Daily means feed the temperature lattice; hourly series back the
//! single-point history view.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use urban_greening_scoring_models::config::WeatherConfig;

use crate::{DateRange, WeatherError, build_client, retry::RetryPolicy, retry::send_json};

/// Timestamp layout of the `hourly.time` array (local time, no zone).
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Client for one Open-Meteo endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

/// One hourly reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    /// Local time of the reading.
    pub time: NaiveDateTime,
    /// Air temperature at 2 m, in °C.
    pub temperature: f64,
}

/// Summary statistics over an hourly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySummary {
    /// Number of readings.
    pub count: usize,
    /// Lowest temperature.
    pub min: f64,
    /// Highest temperature.
    pub max: f64,
    /// Mean temperature.
    pub mean: f64,
    /// Earliest reading.
    pub first: NaiveDateTime,
    /// Latest reading.
    pub last: NaiveDateTime,
}

impl OpenMeteo {
    /// Builds a client from the weather configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.clone(),
            policy: RetryPolicy::from(config),
        })
    }

    async fn query(
        &self,
        latitude: f64,
        longitude: f64,
        range: DateRange,
        series: (&str, &str),
    ) -> Result<serde_json::Value, WeatherError> {
        let params = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("start_date", range.start.to_string()),
            ("end_date", range.end.to_string()),
            (series.0, series.1.to_string()),
            ("timezone", "auto".to_string()),
        ];
        send_json(&self.policy, || self.client.get(&self.base_url).query(&params)).await
    }

    /// Mean daily temperature at a point over `range`.
    ///
    /// Returns `None` if the API reported no values for the period.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] if the request fails after retries or the
    /// response is malformed.
    pub async fn fetch_daily_mean(
        &self,
        latitude: f64,
        longitude: f64,
        range: DateRange,
    ) -> Result<Option<f64>, WeatherError> {
        let body = self
            .query(latitude, longitude, range, ("daily", "temperature_2m_mean"))
            .await?;
        parse_daily_mean(&body)
    }

    /// Hourly temperatures at a point over `range`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] if the request fails after retries or the
    /// response is malformed.
    pub async fn fetch_hourly(
        &self,
        latitude: f64,
        longitude: f64,
        range: DateRange,
    ) -> Result<Vec<HourlyReading>, WeatherError> {
        let body = self
            .query(latitude, longitude, range, ("hourly", "temperature_2m"))
            .await?;
        parse_hourly(&body)
    }
}

fn series<'a>(
    body: &'a serde_json::Value,
    section: &str,
    field: &str,
) -> Result<&'a [serde_json::Value], WeatherError> {
    body[section][field]
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| WeatherError::Parse {
            message: format!("Missing {section}.{field} in Open-Meteo response"),
        })
}

/// Mean of the non-null `daily.temperature_2m_mean` values.
#[allow(clippy::cast_precision_loss)]
fn parse_daily_mean(body: &serde_json::Value) -> Result<Option<f64>, WeatherError> {
    let values: Vec<f64> = series(body, "daily", "temperature_2m_mean")?
        .iter()
        .filter_map(serde_json::Value::as_f64)
        .collect();

    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

/// Pairs `hourly.time` with `hourly.temperature_2m`, skipping nulls.
fn parse_hourly(body: &serde_json::Value) -> Result<Vec<HourlyReading>, WeatherError> {
    let times = series(body, "hourly", "time")?;
    let temperatures = series(body, "hourly", "temperature_2m")?;

    if times.len() != temperatures.len() {
        return Err(WeatherError::Parse {
            message: format!(
                "hourly.time has {} entries but hourly.temperature_2m has {}",
                times.len(),
                temperatures.len()
            ),
        });
    }

    let mut readings = Vec::with_capacity(times.len());
    for (time, temperature) in times.iter().zip(temperatures) {
        let Some(temperature) = temperature.as_f64() else {
            continue;
        };
        let raw = time.as_str().ok_or_else(|| WeatherError::Parse {
            message: format!("Non-string hourly timestamp: {time}"),
        })?;
        let time = NaiveDateTime::parse_from_str(raw, HOURLY_TIME_FORMAT).map_err(|e| {
            WeatherError::Parse {
                message: format!("Bad hourly timestamp '{raw}': {e}"),
            }
        })?;
        readings.push(HourlyReading { time, temperature });
    }

    Ok(readings)
}

/// Count, extremes, mean and time span of an hourly series.
///
/// Returns `None` for an empty series.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_hourly(readings: &[HourlyReading]) -> Option<HourlySummary> {
    let first = readings.iter().map(|r| r.time).min()?;
    let last = readings.iter().map(|r| r.time).max()?;

    let (sum, min, max) = readings.iter().fold(
        (0.0_f64, f64::INFINITY, f64::NEG_INFINITY),
        |(sum, min, max), r| (sum + r.temperature, min.min(r.temperature), max.max(r.temperature)),
    );

    Some(HourlySummary {
        count: readings.len(),
        min,
        max,
        mean: sum / readings.len() as f64,
        first,
        last,
    })
}
