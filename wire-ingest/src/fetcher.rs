use crate::config::FetchConfig;
use crate::events::{PollEvent, PollObserver};
use crate::types::{IngestError, Result};
use backoff::backoff::{Backoff, Constant};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Top-level shape of a JSON response from the feed API.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Value),
    Error(String),
}

impl Envelope {
    /// A body with `data` is a success, one with `error.message` an error,
    /// anything else is an unexpected shape.
    pub fn classify(url: &str, body: Value) -> Result<Envelope> {
        let Value::Object(mut map) = body else {
            return Err(IngestError::UnexpectedShape { url: url.to_string() });
        };

        if let Some(data) = map.remove("data") {
            return Ok(Envelope::Success(data));
        }

        match map.get("error").and_then(|e| e.get("message")).and_then(Value::as_str) {
            Some(message) => Ok(Envelope::Error(message.to_string())),
            None => Err(IngestError::UnexpectedShape { url: url.to_string() }),
        }
    }
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    observer: Arc<dyn PollObserver>,
}

impl Fetcher {
    pub fn new(config: FetchConfig, observer: Arc<dyn PollObserver>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| IngestError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config, observer })
    }

    /// GET `url` and return the `data` member of a success envelope.
    ///
    /// Transport failures and error envelopes are retried with a fixed delay
    /// while the configured counter rule allows it. Unexpected shapes fail at once.
    pub async fn fetch_json(&self, url: &str, headers: &HeaderMap) -> Result<Value> {
        let mut backoff = Constant::new(self.config.retry_delay);
        let mut attempt: u32 = 0;

        loop {
            let error = match self.fetch_envelope(url, headers).await {
                Ok(Envelope::Success(data)) => return Ok(data),
                Ok(Envelope::Error(message)) => IngestError::Remote { message },
                Err(e) if e.is_retryable() => e,
                Err(e) => {
                    error!("Unretryable response from {}: {}", url, e);
                    return Err(e);
                }
            };

            if !self.config.retry_counter.should_retry(attempt, self.config.attempt_budget) {
                error!("Page fetch failed at attempt counter {} for {}: {}", attempt, url, error);
                return Err(error);
            }

            let delay = backoff.next_backoff().unwrap_or(self.config.retry_delay);
            attempt += 1;
            self.observer.on_event(&PollEvent::PageFetchRetried {
                url: url.to_string(),
                attempt,
                error: error.to_string(),
                delay,
            });
            tokio::time::sleep(delay).await;
        }
    }

    async fn fetch_envelope(&self, url: &str, headers: &HeaderMap) -> Result<Envelope> {
        debug!("Fetching page: {}", url);

        let response = self.client.get(url).headers(headers.clone()).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => Envelope::classify(url, body),
            Err(_) if !status.is_success() => Err(IngestError::Transient(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            ))),
            Err(_) => Err(IngestError::UnexpectedShape { url: url.to_string() }),
        }
    }

    /// Plain GET returning the body as text. Never retried.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching content from: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::Transient(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content = response.text().await?;
        Ok(content)
    }
}
