//! HTTP retry with exponential backoff.
//!
//! Every weather request goes through [`send_json`] rather than calling
//! `reqwest::RequestBuilder::send()` directly:
//!
//! ```ignore
//! let body = retry::send_json(&policy, || client.get(url).query(&params)).await?;
//! ```

use std::time::Duration;

use urban_greening_scoring_models::config::WeatherConfig;

use crate::WeatherError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX))
    }
}

impl From<&WeatherConfig> for RetryPolicy {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

/// What to do with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Accept,
    Retry,
    Fail,
}

/// 429 and 5xx are worth retrying; any other 4xx is permanent.
fn classify(status: reqwest::StatusCode) -> Disposition {
    if status.as_u16() == 429 || status.is_server_error() {
        Disposition::Retry
    } else if status.is_client_error() {
        Disposition::Fail
    } else {
        Disposition::Accept
    }
}

/// Sends the request built by `build_request` and parses the body as JSON.
///
/// The closure is called once per attempt, since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// Returns [`WeatherError`] if the request still fails after the retry
/// budget, the server answers with a permanent error status, or the body
/// is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    policy: &RetryPolicy,
    build_request: F,
) -> Result<serde_json::Value, WeatherError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(policy, &build_request).await?;
    let url = response.url().to_string();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::error!("JSON parse failed for {url}: {e}\n  body preview: {preview}");
        WeatherError::Parse {
            message: format!("invalid JSON from {url}: {e}"),
        }
    })
}

#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    policy: &RetryPolicy,
    build_request: &F,
) -> Result<reqwest::Response, WeatherError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(WeatherError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                match classify(status) {
                    Disposition::Accept => return Ok(response),
                    Disposition::Retry if attempt < max_retries => {
                        log::warn!("  HTTP {status} from {}", response.url());
                        attempt += 1;
                    }
                    Disposition::Retry | Disposition::Fail => {
                        return Err(WeatherError::Status {
                            status: status.as_u16(),
                            url: response.url().to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
