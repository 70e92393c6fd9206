#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wire_ingest::{PollConfig, PollEvent, PollObserver, WireSource};
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PollEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PollEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PollObserver for RecordingObserver {
    fn on_event(&self, event: &PollEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Config pointed at the mock server, with a short retry delay.
pub fn config_for(server: &MockServer) -> PollConfig {
    let mut config = PollConfig::default();
    config.source = WireSource::associated_press()
        .with_feed_url(format!("{}/feed?start=1", server.uri()));
    config.fetch.retry_delay = Duration::from_millis(10);
    config.fetch.timeout_seconds = 5;
    config
}

pub fn page(items: Vec<Value>, next_page: Option<&str>) -> Value {
    let mut data = json!({
        "current_item_count": items.len(),
        "items": items,
    });
    if let Some(next) = next_page {
        data["next_page"] = json!(next);
    }
    json!({ "data": data })
}

pub fn item_with_rendition(etag: &str, href: &str) -> Value {
    json!({
        "item": {
            "altids": { "etag": etag },
            "type": "text",
            "pubstatus": "usable",
            "version": 1,
            "renditions": { "nitf": { "href": href } }
        }
    })
}

pub fn nitf(headline: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<nitf>
  <head><docdata><date.issue norm="20240514T120000Z"/></docdata></head>
  <body>
    <body.head>
      <hedline><hl1 id="headline">{headline}</hl1></hedline>
      <byline>By Staff</byline>
    </body.head>
    <body.content>
      <block>
        <p>{body}</p>
      </block>
    </body.content>
  </body>
</nitf>"#
    )
}
