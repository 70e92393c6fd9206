use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Feed entry had no `item` member.
    MissingItem,
    /// `item` is present but does not decode.
    MalformedItem(String),
    /// Item lists no rendition in the configured format.
    MissingRendition,
    ContentFetchFailed(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingItem => write!(f, "missing item"),
            DropReason::MalformedItem(e) => write!(f, "malformed item: {}", e),
            DropReason::MissingRendition => write!(f, "missing rendition"),
            DropReason::ContentFetchFailed(e) => write!(f, "content fetch failed: {}", e),
        }
    }
}

/// Discrete events emitted while a poll runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    PageFetchRetried {
        url: String,
        attempt: u32,
        error: String,
        delay: Duration,
    },
    ItemDropped {
        revision: Option<String>,
        reason: DropReason,
    },
    PageCompleted {
        cursor: String,
        next_cursor: String,
        payloads: usize,
        dropped: usize,
    },
}

/// Receives poll events. Implementations must not block.
pub trait PollObserver: Send + Sync {
    fn on_event(&self, event: &PollEvent);
}

/// Default observer: one `tracing` event per poll event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PollObserver for TracingObserver {
    fn on_event(&self, event: &PollEvent) {
        match event {
            PollEvent::PageFetchRetried { url, attempt, error, delay } => {
                let delay_ms = delay.as_millis() as u64;
                warn!(%url, attempt, %error, delay_ms, "page fetch retried");
            }
            PollEvent::ItemDropped { revision, reason } => {
                warn!(revision = revision.as_deref().unwrap_or("-"), %reason, "item dropped");
            }
            PollEvent::PageCompleted { cursor, next_cursor, payloads, dropped } => {
                info!(%cursor, %next_cursor, payloads, dropped, "page completed");
            }
        }
    }
}
