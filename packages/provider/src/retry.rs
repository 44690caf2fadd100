//! HTTP send helper with bounded retry for transient errors.
//!
//! Provider clients call [`send_json`] instead of
//! `reqwest::RequestBuilder::send()` directly. Retry lives here, at the
//! provider boundary, so the aggregation code above stays deterministic
//! for a given set of provider responses.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url).query(&params), policy).await?;
//! ```

use std::time::Duration;

use crate::ProviderError;

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 300;

/// How many times to retry a transient failure, and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retry.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with `max_retries` retries starting at a 500ms delay.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0)
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// Retries connection errors, timeouts, HTTP 429 and HTTP 5xx up to
/// `policy.max_retries` times. Other 4xx responses and undecodable bodies
/// fail immediately.
///
/// # Errors
///
/// Returns [`ProviderError`] if the request still fails after all
/// retries, the server returns a non-retryable status, or the body is not
/// valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    policy: RetryPolicy,
) -> Result<serde_json::Value, ProviderError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, policy).await?;
    let url = response.url().to_string();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        log::warn!("JSON parse failed for {url}: {e}");
        ProviderError::Malformed {
            message: format!("invalid JSON from {url}: {e} (body: {})", preview(&text)),
        }
    })
}

/// Core retry loop. Returns the first 2xx/3xx response.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    policy: RetryPolicy,
) -> Result<reqwest::Response, ProviderError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }
        let can_retry = attempt < policy.max_retries;
        attempt += 1;

        let response = match build_request().send().await {
            Ok(response) => response,
            Err(e) if is_transient(&e) && can_retry => {
                log::warn!("  transient error: {e}");
                continue;
            }
            Err(e) => return Err(ProviderError::Http(e)),
        };

        let status = response.status();
        let retryable =
            status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

        if retryable && can_retry {
            log::warn!("  HTTP {status} from {}", response.url());
            continue;
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        return Ok(response);
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body()
}

fn preview(text: &str) -> String {
    if text.len() > BODY_PREVIEW_LEN {
        let cut = (0..=BODY_PREVIEW_LEN)
            .rev()
            .find(|&i| text.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(2000));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(400);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert!(p.len() <= BODY_PREVIEW_LEN + 3);
        assert_eq!(preview("short"), "short");
    }
}
