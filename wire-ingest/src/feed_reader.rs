use crate::events::{DropReason, PollEvent, PollObserver};
use crate::fetcher::Fetcher;
use crate::sources::WireSource;
use crate::types::{FeedPage, IngestError, RawFeedItem, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct FeedData {
    #[serde(default)]
    current_item_count: Option<u64>,
    #[serde(default)]
    items: Option<Vec<Value>>,
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    item: Option<Value>,
}

/// Reads one page of the feed starting at a cursor.
pub struct FeedPageReader {
    fetcher: Arc<Fetcher>,
    source: WireSource,
    observer: Arc<dyn PollObserver>,
}

impl FeedPageReader {
    pub fn new(
        fetcher: Arc<Fetcher>,
        source: WireSource,
        observer: Arc<dyn PollObserver>,
    ) -> Self {
        Self { fetcher, source, observer }
    }

    pub async fn read_page(&self, cursor: &str, credential: &str) -> Result<FeedPage> {
        let url = self.source.start_cursor(cursor);
        Url::parse(url)?;

        let headers = self.auth_headers(credential)?;
        let data = self.fetcher.fetch_json(url, &headers).await?;
        let data: FeedData = serde_json::from_value(data)
            .map_err(|_| IngestError::UnexpectedShape { url: url.to_string() })?;

        let entries = data.items.unwrap_or_default();
        debug!(
            "Feed page reports {} items, {} entries received",
            data.current_item_count.unwrap_or(0),
            entries.len()
        );

        let mut items = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in entries {
            match self.decode_entry(entry) {
                Ok(item) => items.push(item),
                Err((revision, reason)) => {
                    skipped += 1;
                    self.observer.on_event(&PollEvent::ItemDropped { revision, reason });
                }
            }
        }
        if skipped > 0 {
            warn!("Skipped {} feed entries without a usable item", skipped);
        }

        Ok(FeedPage {
            items,
            next_cursor: self.source.next_cursor(data.next_page.as_deref()),
            skipped,
        })
    }

    fn decode_entry(
        &self,
        entry: Value,
    ) -> std::result::Result<RawFeedItem, (Option<String>, DropReason)> {
        let item = match serde_json::from_value::<FeedEntry>(entry) {
            Ok(FeedEntry { item: Some(item) }) if !item.is_null() => item,
            _ => return Err((None, DropReason::MissingItem)),
        };

        let revision = item
            .pointer("/altids/etag")
            .and_then(Value::as_str)
            .map(str::to_string);
        serde_json::from_value::<RawFeedItem>(item)
            .map_err(|e| (revision, DropReason::MalformedItem(e.to_string())))
    }

    fn auth_headers(&self, credential: &str) -> Result<HeaderMap> {
        let name = HeaderName::from_bytes(self.source.api_key_header.as_bytes())
            .map_err(|e| IngestError::Config(format!("invalid api key header name: {}", e)))?;
        let mut value = HeaderValue::from_str(credential).map_err(|_| {
            IngestError::Config("credential is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        Ok(headers)
    }
}
