use crate::config::PollConfig;
use crate::events::{PollEvent, PollObserver, TracingObserver};
use crate::feed_reader::FeedPageReader;
use crate::fetcher::Fetcher;
use crate::resolver::ItemContentResolver;
use crate::transform::PayloadTransformer;
use crate::types::{CanonicalPayload, IngestError, PollRequest, PollResponse, Result, WirePoller};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stages a single poll moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    FetchingPage,
    ResolvingItems,
    Done,
    Failed,
}

/// Composes page reading, content resolution and transformation into one poll.
pub struct PollOrchestrator {
    config: PollConfig,
    reader: FeedPageReader,
    resolver: ItemContentResolver,
    transformer: PayloadTransformer,
    observer: Arc<dyn PollObserver>,
}

impl PollOrchestrator {
    pub fn new(config: PollConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(config: PollConfig, observer: Arc<dyn PollObserver>) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone(), observer.clone())?);
        let reader = FeedPageReader::new(fetcher.clone(), config.source.clone(), observer.clone());
        let resolver = ItemContentResolver::new(
            fetcher,
            config.source.rendition_format.clone(),
            config.item_failure,
            observer.clone(),
        );
        let transformer = PayloadTransformer::new(config.source.feed_tag.clone());

        Ok(Self {
            config,
            reader,
            resolver,
            transformer,
            observer,
        })
    }

    /// Runs one poll cycle from `cursor`.
    ///
    /// On error no cursor is returned and the caller must keep the one it passed in.
    pub async fn poll(
        &self,
        credential: &str,
        cursor: &str,
    ) -> Result<(Vec<CanonicalPayload>, String)> {
        let mut state = PollState::Idle;
        let result = self.run(credential, cursor, &mut state).await;
        match &result {
            Ok((payloads, _)) => debug!(?state, payloads = payloads.len(), "poll finished"),
            Err(e) => warn!(state = ?PollState::Failed, from = ?state, "poll failed: {}", e),
        }
        result
    }

    async fn run(
        &self,
        credential: &str,
        cursor: &str,
        state: &mut PollState,
    ) -> Result<(Vec<CanonicalPayload>, String)> {
        *state = PollState::FetchingPage;
        let page = self.reader.read_page(cursor, credential).await?;

        if page.items.is_empty() {
            *state = PollState::Done;
            self.observer.on_event(&PollEvent::PageCompleted {
                cursor: cursor.to_string(),
                next_cursor: page.next_cursor.clone(),
                payloads: 0,
                dropped: page.skipped,
            });
            return Ok((Vec::new(), page.next_cursor));
        }

        *state = PollState::ResolvingItems;
        info!("Resolving {} items", page.items.len());
        let resolution = self.resolver.resolve_all(page.items).await?;

        let payloads: Vec<CanonicalPayload> = resolution
            .items
            .iter()
            .map(|resolved| self.transformer.transform(resolved))
            .collect();

        *state = PollState::Done;
        self.observer.on_event(&PollEvent::PageCompleted {
            cursor: cursor.to_string(),
            next_cursor: page.next_cursor.clone(),
            payloads: payloads.len(),
            dropped: page.skipped + resolution.dropped,
        });

        Ok((payloads, page.next_cursor))
    }
}

impl WirePoller for PollOrchestrator {
    type Error = IngestError;

    /// Runs one invocation. Per-request overrides of the attempt budget or
    /// retry delay get a fresh orchestrator built from this one's config.
    async fn poll(&self, request: PollRequest) -> Result<PollResponse> {
        let overridden = request.attempt_budget.is_some() || request.retry_delay_ms.is_some();
        let (payloads, next_cursor) = if overridden {
            let mut config = self.config.clone();
            config.apply_request(&request);
            PollOrchestrator::with_observer(config, self.observer.clone())?
                .poll(&request.credential, &request.cursor)
                .await?
        } else {
            PollOrchestrator::poll(self, &request.credential, &request.cursor).await?
        };

        Ok(PollResponse { payloads, next_cursor })
    }
}
