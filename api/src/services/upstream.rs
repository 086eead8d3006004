//! Shared outbound HTTP layer: timeout, throttle, bounded retry with backoff

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::constants::USER_AGENT;
use crate::services::rate_limit::UpstreamRateLimiter;

/// Unreserved URL characters stay literal; everything else is escaped
pub const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{host} responded with {status}")]
    Status { host: String, status: StatusCode },
    #[error("{0} is throttled, request not sent")]
    Throttled(String),
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
}

#[derive(Clone)]
pub struct Upstream {
    http: Client,
    config: UpstreamConfig,
    limiter: Arc<UpstreamRateLimiter>,
}

impl Upstream {
    pub fn new(
        config: UpstreamConfig,
        limiter: Arc<UpstreamRateLimiter>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            limiter,
        })
    }

    /// GET `url`, returning the response only when its status is 2xx.
    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, UpstreamError> {
        let response = self
            .execute(url, |http| {
                headers
                    .iter()
                    .fold(http.get(url), |req, (name, value)| req.header(*name, *value))
            })
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status {
                host: host_of(url),
                status: response.status(),
            });
        }

        Ok(response)
    }

    /// Send the request produced by `build`, retrying 429/5xx and transport
    /// failures. The final response is returned whatever its status.
    pub async fn execute<F>(&self, url: &str, build: F) -> Result<Response, UpstreamError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let host = parse_host(url).ok_or_else(|| UpstreamError::InvalidUrl(url.to_string()))?;

        if !self.limiter.check(&host) {
            tracing::warn!(%host, "upstream throttled locally");
            return Err(UpstreamError::Throttled(host));
        }

        let mut attempt = 0;
        loop {
            let result = build(&self.http).send().await;

            let retryable = match &result {
                Ok(resp) => is_retryable_status(resp.status()),
                Err(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            };

            if !retryable || attempt >= self.config.max_retries {
                return Ok(result?);
            }

            let delay = self.backoff(attempt);
            match &result {
                Ok(resp) => tracing::warn!(%host, status = %resp.status(), attempt, ?delay, "retrying upstream request"),
                Err(e) => tracing::warn!(%host, error = %e, attempt, ?delay, "retrying upstream request"),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry_base_delay.as_millis() as u64;
        let exp = base.saturating_mul(1u64 << attempt.min(10));
        let jitter = rand::rng().random_range(0..=base / 2);
        Duration::from_millis(exp + jitter)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn parse_host(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn host_of(url: &str) -> String {
    parse_host(url).unwrap_or_else(|| url.to_string())
}
