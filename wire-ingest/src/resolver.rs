use crate::config::ItemFailurePolicy;
use crate::events::{DropReason, PollEvent, PollObserver};
use crate::fetcher::Fetcher;
use crate::parser::ContentExtractor;
use crate::types::{IngestError, RawFeedItem, ResolvedItem, Result};
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

/// Fetches and parses the rendition of every item on a page.
pub struct ItemContentResolver {
    fetcher: Arc<Fetcher>,
    extractor: ContentExtractor,
    rendition_format: String,
    policy: ItemFailurePolicy,
    observer: Arc<dyn PollObserver>,
}

pub struct Resolution {
    pub items: Vec<ResolvedItem>,
    pub dropped: usize,
}

impl ItemContentResolver {
    pub fn new(
        fetcher: Arc<Fetcher>,
        rendition_format: impl Into<String>,
        policy: ItemFailurePolicy,
        observer: Arc<dyn PollObserver>,
    ) -> Self {
        Self {
            fetcher,
            extractor: ContentExtractor::new(),
            rendition_format: rendition_format.into(),
            policy,
            observer,
        }
    }

    /// Resolves all items concurrently and joins them. Output keeps input order.
    ///
    /// Items without a rendition are always dropped. Fetch failures are dropped
    /// under `ItemFailurePolicy::Drop` and fail the call under `Propagate`.
    pub async fn resolve_all(&self, items: Vec<RawFeedItem>) -> Result<Resolution> {
        let outcomes = join_all(items.into_iter().map(|item| self.resolve(item))).await;

        let mut resolved = Vec::with_capacity(outcomes.len());
        let mut dropped = 0;
        for outcome in outcomes {
            match outcome {
                Ok(Some(item)) => resolved.push(item),
                Ok(None) => dropped += 1,
                Err(IngestError::ItemFetch { revision, source })
                    if self.policy == ItemFailurePolicy::Drop =>
                {
                    dropped += 1;
                    self.observer.on_event(&PollEvent::ItemDropped {
                        revision: Some(revision),
                        reason: DropReason::ContentFetchFailed(source.to_string()),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Resolution { items: resolved, dropped })
    }

    /// `Ok(None)` means the item has no rendition to fetch.
    pub async fn resolve(&self, item: RawFeedItem) -> Result<Option<ResolvedItem>> {
        let Some(href) = item.rendition_href(&self.rendition_format) else {
            self.observer.on_event(&PollEvent::ItemDropped {
                revision: item.revision_id().map(str::to_string),
                reason: DropReason::MissingRendition,
            });
            return Ok(None);
        };

        let document = self.fetcher.fetch_text(href).await.map_err(|e| IngestError::ItemFetch {
            revision: item.revision_id().unwrap_or("-").to_string(),
            source: Box::new(e),
        })?;
        let extracted = self.extractor.extract(&document);
        debug!("Resolved revision {}", item.revision_id().unwrap_or("-"));

        Ok(Some(ResolvedItem { item, document, extracted }))
    }
}
