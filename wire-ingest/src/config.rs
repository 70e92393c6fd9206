use crate::sources::WireSource;
use crate::types::{IngestError, PollRequest, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// How the attempt counter decides whether a failed page fetch is tried again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryCounterMode {
    /// Retry only while `0 < attempt < budget`. The counter starts at 0, so the
    /// first failure of a fresh fetch is never retried. Kept as the default until
    /// the product owner confirms the intended boundary.
    #[default]
    Literal,
    /// Retry from the first failure until `budget` attempts have been made.
    FromFirstFailure,
}

impl RetryCounterMode {
    pub fn should_retry(self, attempt: u32, budget: u32) -> bool {
        match self {
            RetryCounterMode::Literal => attempt > 0 && attempt < budget,
            RetryCounterMode::FromFirstFailure => attempt.saturating_add(1) < budget,
        }
    }
}

/// What happens to the whole poll when one item's rendition cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemFailurePolicy {
    /// Log the failure, drop the item, keep the rest of the page.
    #[default]
    Drop,
    /// Fail the invocation on the first item error (in input order).
    Propagate,
}

impl FromStr for ItemFailurePolicy {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(ItemFailurePolicy::Drop),
            "propagate" => Ok(ItemFailurePolicy::Propagate),
            other => Err(IngestError::Config(format!("unknown item failure policy: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub attempt_budget: u32,
    pub retry_delay: Duration,
    pub retry_counter: RetryCounterMode,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Wire-Ingest/1.0".to_string(),
            timeout_seconds: 30,
            attempt_budget: 3,
            retry_delay: Duration::from_secs(10),
            retry_counter: RetryCounterMode::Literal,
        }
    }
}

impl FetchConfig {
    /// Upper bound on time spent in one page fetch: `budget * (timeout + delay)`.
    /// Must stay below the host invocation deadline.
    pub fn worst_case_latency(&self) -> Duration {
        (Duration::from_secs(self.timeout_seconds) + self.retry_delay) * self.attempt_budget
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollConfig {
    pub fetch: FetchConfig,
    pub source: WireSource,
    pub item_failure: ItemFailurePolicy,
}

impl PollConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = PollConfig::default();

        if let Ok(url) = env::var("WIRE_FEED_URL") {
            config.source = config.source.with_feed_url(url);
        }
        if let Some(budget) = parse_var::<u32>("WIRE_ATTEMPT_BUDGET")? {
            config.fetch.attempt_budget = budget;
        }
        if let Some(ms) = parse_var::<u64>("WIRE_RETRY_DELAY_MS")? {
            config.fetch.retry_delay = Duration::from_millis(ms);
        }
        if let Some(true) = parse_var::<bool>("WIRE_RETRY_FROM_FIRST_FAILURE")? {
            config.fetch.retry_counter = RetryCounterMode::FromFirstFailure;
        }
        if let Ok(policy) = env::var("WIRE_ITEM_FAILURE") {
            config.item_failure = policy.parse()?;
        }

        Ok(config)
    }

    /// Applies the optional per-invocation overrides.
    pub fn apply_request(&mut self, request: &PollRequest) {
        if let Some(budget) = request.attempt_budget {
            self.fetch.attempt_budget = budget;
        }
        if let Some(ms) = request.retry_delay_ms {
            self.fetch.retry_delay = Duration::from_millis(ms);
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| IngestError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_counter_boundary() {
        let mode = RetryCounterMode::Literal;
        assert!(!mode.should_retry(0, 3));
        assert!(mode.should_retry(1, 3));
        assert!(mode.should_retry(2, 3));
        assert!(!mode.should_retry(3, 3));
    }

    #[test]
    fn from_first_failure_counter_boundary() {
        let mode = RetryCounterMode::FromFirstFailure;
        assert!(mode.should_retry(0, 3));
        assert!(mode.should_retry(1, 3));
        assert!(!mode.should_retry(2, 3));
        assert!(!mode.should_retry(0, 1));
        assert!(!mode.should_retry(0, 0));
    }

    #[test]
    fn request_overrides_budget_and_delay() {
        let mut config = PollConfig::default();
        config.apply_request(&PollRequest {
            credential: "k".to_string(),
            cursor: String::new(),
            attempt_budget: Some(5),
            retry_delay_ms: Some(20),
        });
        assert_eq!(config.fetch.attempt_budget, 5);
        assert_eq!(config.fetch.retry_delay, Duration::from_millis(20));
    }

    #[test]
    fn defaults_bound_worst_case_latency() {
        let config = FetchConfig::default();
        assert_eq!(config.worst_case_latency(), Duration::from_secs(120));
    }

    #[test]
    fn item_failure_policy_parses() {
        assert_eq!("drop".parse::<ItemFailurePolicy>().unwrap(), ItemFailurePolicy::Drop);
        assert_eq!(
            " Propagate ".parse::<ItemFailurePolicy>().unwrap(),
            ItemFailurePolicy::Propagate
        );
        assert!("ignore".parse::<ItemFailurePolicy>().is_err());
    }
}
