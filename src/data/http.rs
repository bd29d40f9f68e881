//! Blocking HTTP helpers shared by the providers.

use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::warn;

use crate::domain::HttpSettings;
use crate::error::AppError;

pub fn build_client(settings: &HttpSettings) -> Result<Client, AppError> {
    Client::builder()
        .timeout(settings.timeout)
        .user_agent(concat!("Mozilla/5.0 (compatible; jobs-chart/", env!("CARGO_PKG_VERSION"), ")"))
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Send a request, retrying connect/timeout failures up to `max_retries` times.
///
/// `build` is called once per attempt because a blocking `RequestBuilder` is
/// consumed by `send`.
pub fn send_with_retry(
    provider: &'static str,
    settings: &HttpSettings,
    build: impl Fn() -> RequestBuilder,
) -> Result<Response, AppError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match build().send() {
            Ok(resp) => return Ok(resp),
            Err(e) if is_transient(&e) && attempt <= settings.max_retries => {
                let delay = settings.backoff * attempt;
                warn!(provider, attempt, ?delay, error = %e, "transient request failure, retrying");
                std::thread::sleep(delay);
            }
            Err(e) => {
                return Err(AppError::Transport {
                    provider,
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Turn a non-2xx response into an upstream error, keeping a short body excerpt.
pub fn ensure_success(provider: &'static str, resp: Response) -> Result<Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    Err(AppError::UpstreamRequest {
        provider,
        message: if excerpt.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {}", excerpt.trim())
        },
    })
}
