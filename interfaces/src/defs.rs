use std::future::Future;

use serde::{Deserialize, Serialize};

/// One ingested content revision in the internal, source-agnostic shape.
///
/// `external_id` names a revision, not an item. Downstream queues deduplicate on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPayload {
    pub external_id: String,
    pub body: PayloadBody,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadBody {
    pub source: String,
    pub version: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_content_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ednote: Option<String>,
    pub image_ids: Vec<String>,
}

/// Input handed over by the scheduler for one poll invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    pub credential: String,
    pub cursor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub payloads: Vec<CanonicalPayload>,
    pub next_cursor: String,
}

// Object style note:
// Pollers run inside short lived single-task invocations. They keep no state
// between calls; the caller stores `next_cursor` and hands it back on the next
// request. On error the caller keeps the cursor it already had.

pub trait WirePoller {
    type Error;

    fn poll(
        &self,
        request: PollRequest,
    ) -> impl Future<Output = Result<PollResponse, Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_missing_overrides() {
        let request: PollRequest =
            serde_json::from_str(r#"{"credential":"k","cursor":"https://feed"}"#).unwrap();
        assert_eq!(request.attempt_budget, None);
        assert_eq!(request.retry_delay_ms, None);

        let request: PollRequest = serde_json::from_str(
            r#"{"credential":"k","cursor":"","attemptBudget":5,"retryDelayMs":250}"#,
        ).unwrap();
        assert_eq!(request.attempt_budget, Some(5));
        assert_eq!(request.retry_delay_ms, Some(250));
    }

    #[test]
    fn payload_uses_wire_field_names() {
        let payload = CanonicalPayload {
            external_id: "123".to_owned(),
            body: PayloadBody {
                source: "AP".to_owned(),
                version: "0".to_owned(),
                item_type: Some("text".to_owned()),
                summary: Some("short".to_owned()),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["externalId"], "123");
        assert_eq!(value["body"]["type"], "text");
        assert_eq!(value["body"]["abstract"], "short");
        assert_eq!(value["body"]["imageIds"], serde_json::json!([]));
        assert!(value["body"].get("headline").is_none());
    }
}
