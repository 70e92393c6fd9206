use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
// Use the interfaces crate for the downstream contract
pub use interfaces::defs::{CanonicalPayload, PayloadBody, PollRequest, PollResponse, WirePoller};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AltIds {
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub itemid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Byline {
    #[serde(default)]
    pub by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Association {
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub itemid: Option<String>,
    #[serde(default)]
    pub altids: Option<AltIds>,
}

impl Association {
    pub fn media_id(&self) -> Option<&str> {
        self.altids
            .as_ref()
            .and_then(|ids| ids.itemid.as_deref())
            .or(self.itemid.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    #[serde(default)]
    pub href: Option<String>,
}

/// One upstream content revision as listed in a feed page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFeedItem {
    #[serde(default)]
    pub altids: Option<AltIds>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub version: Option<u64>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub pubstatus: Option<String>,
    #[serde(default)]
    pub firstcreated: Option<String>,
    #[serde(default)]
    pub versioncreated: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub urgency: Option<i64>,
    #[serde(default)]
    pub ednote: Option<String>,
    #[serde(default)]
    pub bylines: Vec<Byline>,
    #[serde(default)]
    pub subject: Vec<Subject>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub associations: IndexMap<String, Association>,
    #[serde(default)]
    pub renditions: HashMap<String, Rendition>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Accepts `5` or `"5"`. A string that is not a number reads as absent.
fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    Ok(match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

impl RawFeedItem {
    pub fn revision_id(&self) -> Option<&str> {
        self.altids.as_ref().and_then(|ids| ids.etag.as_deref())
    }

    pub fn rendition_href(&self, format: &str) -> Option<&str> {
        self.renditions
            .get(format)
            .and_then(|r| r.href.as_deref())
            .filter(|href| !href.is_empty())
    }
}

/// Fields pulled out of one rendition document. Each one is independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub body_content_html: Option<String>,
    pub issue_date: Option<String>,
    pub byline: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub ed_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedItem {
    pub item: RawFeedItem,
    pub document: String,
    pub extracted: ExtractedContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub items: Vec<RawFeedItem>,
    pub next_cursor: String,
    /// Entries skipped because they carried no usable `item`.
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Transient fetch error: {0}")]
    Transient(String),

    #[error("Remote error: {message}")]
    Remote { message: String },

    #[error("Unexpected response shape from {url}")]
    UnexpectedShape { url: String },

    #[error("Content fetch failed for revision {revision}: {source}")]
    ItemFetch {
        revision: String,
        #[source]
        source: Box<IngestError>,
    },

    #[error("Invalid cursor: {0}")]
    InvalidCursor(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Transport failures and upstream error envelopes go through the retry rule.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::Transient(_) | IngestError::Remote { .. })
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        IngestError::Transient(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
