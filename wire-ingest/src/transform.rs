use crate::types::{CanonicalPayload, PayloadBody, RawFeedItem, ResolvedItem};

/// External id for items that carry no revision id. Not a real id.
pub const UNIDENTIFIED_EXTERNAL_ID: &str = "NO_ETAG";

const DIRECT_RELATION: &str = "direct";
const PICTURE_TYPE: &str = "picture";

/// Maps a resolved item onto the canonical payload. Pure and total.
#[derive(Debug, Clone)]
pub struct PayloadTransformer {
    source_tag: String,
}

impl PayloadTransformer {
    pub fn new(source_tag: impl Into<String>) -> Self {
        Self { source_tag: source_tag.into() }
    }

    pub fn transform(&self, resolved: &ResolvedItem) -> CanonicalPayload {
        let item = &resolved.item;
        let extracted = &resolved.extracted;

        CanonicalPayload {
            external_id: item.revision_id().unwrap_or(UNIDENTIFIED_EXTERNAL_ID).to_string(),
            body: PayloadBody {
                source: self.source_tag.clone(),
                version: item.version.unwrap_or(0).to_string(),
                item_type: item.item_type.clone(),
                status: item.pubstatus.clone(),
                first_version: item.firstcreated.clone(),
                version_created: item.versioncreated.clone(),
                headline: item
                    .title
                    .clone()
                    .or_else(|| item.headline.clone())
                    .or_else(|| extracted.headline.clone()),
                byline: byline(item).or_else(|| extracted.byline.clone()),
                priority: item.urgency,
                keywords: keywords(item),
                body_text: extracted.body_content_html.clone(),
                summary: extracted.summary.clone(),
                original_content_text: Some(resolved.document.clone()),
                ednote: item.ednote.clone(),
                image_ids: image_ids(item),
            },
        }
    }
}

fn byline(item: &RawFeedItem) -> Option<String> {
    let names: Vec<&str> = item.bylines.iter().filter_map(|b| b.by.as_deref()).collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Direct subject names first, then every whitespace token of the free-text keywords.
fn keywords(item: &RawFeedItem) -> Vec<String> {
    let subjects = item
        .subject
        .iter()
        .filter(|s| s.rels.iter().any(|rel| rel == DIRECT_RELATION))
        .filter_map(|s| s.name.clone());

    let tokens = item
        .keywords
        .iter()
        .flat_map(|k| k.split_whitespace())
        .map(str::to_string);

    subjects.chain(tokens).collect()
}

fn image_ids(item: &RawFeedItem) -> Vec<String> {
    item.associations
        .values()
        .filter(|a| a.media_type.as_deref() == Some(PICTURE_TYPE))
        .filter_map(|a| a.media_id())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractedContent;
    use serde_json::json;

    fn resolved(item: serde_json::Value, extracted: ExtractedContent) -> ResolvedItem {
        ResolvedItem {
            item: serde_json::from_value(item).unwrap(),
            document: "<nitf/>".to_string(),
            extracted,
        }
    }

    #[test]
    fn maps_reference_item() {
        let resolved = resolved(
            json!({
                "altids": {"etag": "123"},
                "keywords": ["k2 k3"],
                "subject": [{"name": "k1", "rels": ["direct"]}],
                "associations": {"1": {"type": "picture", "itemid": "img-1"}}
            }),
            ExtractedContent::default(),
        );

        let payload = PayloadTransformer::new("AP").transform(&resolved);
        assert_eq!(payload.external_id, "123");
        assert_eq!(payload.body.keywords, vec!["k1", "k2", "k3"]);
        assert_eq!(payload.body.image_ids, vec!["img-1"]);
        assert_eq!(payload.body.version, "0");
        assert_eq!(payload.body.source, "AP");
        assert_eq!(payload.body.original_content_text.as_deref(), Some("<nitf/>"));
    }

    #[test]
    fn missing_etag_uses_sentinel() {
        let item = resolved(json!({}), ExtractedContent::default());
        let payload = PayloadTransformer::new("AP").transform(&item);
        assert_eq!(payload.external_id, UNIDENTIFIED_EXTERNAL_ID);
    }

    #[test]
    fn headline_precedence() {
        let extracted = ExtractedContent {
            headline: Some("from doc".to_string()),
            ..Default::default()
        };
        let transformer = PayloadTransformer::new("AP");

        let both = resolved(json!({"title": "t", "headline": "h"}), extracted.clone());
        assert_eq!(transformer.transform(&both).body.headline.as_deref(), Some("t"));

        let headline_only = resolved(json!({"headline": "h"}), extracted.clone());
        assert_eq!(transformer.transform(&headline_only).body.headline.as_deref(), Some("h"));

        let neither = resolved(json!({}), extracted);
        assert_eq!(transformer.transform(&neither).body.headline.as_deref(), Some("from doc"));
    }

    #[test]
    fn byline_joins_authors_or_falls_back() {
        let extracted = ExtractedContent {
            byline: Some("By DOC".to_string()),
            ..Default::default()
        };
        let transformer = PayloadTransformer::new("AP");

        let authors = resolved(json!({"bylines": [{"by": "A"}, {"by": "B"}]}), extracted.clone());
        assert_eq!(transformer.transform(&authors).body.byline.as_deref(), Some("A, B"));

        let nameless = resolved(json!({"bylines": [{}]}), extracted.clone());
        assert_eq!(transformer.transform(&nameless).body.byline.as_deref(), Some("By DOC"));

        let none = resolved(json!({}), extracted);
        assert_eq!(transformer.transform(&none).body.byline.as_deref(), Some("By DOC"));
    }

    #[test]
    fn keywords_skip_indirect_subjects_and_keep_duplicates() {
        let item = resolved(
            json!({
                "subject": [
                    {"name": "a", "rels": ["inferred"]},
                    {"name": "b", "rels": ["inferred", "direct"]},
                    {"rels": ["direct"]}
                ],
                "keywords": ["b  c", "", "c"]
            }),
            ExtractedContent::default(),
        );
        let payload = PayloadTransformer::new("AP").transform(&item);
        assert_eq!(payload.body.keywords, vec!["b", "b", "c", "c"]);
    }

    #[test]
    fn image_ids_keep_association_order() {
        let item = resolved(
            json!({
                "associations": {
                    "3": {"type": "picture", "altids": {"itemid": "c"}},
                    "1": {"type": "video", "itemid": "v"},
                    "2": {"type": "picture", "itemid": "a"},
                    "4": {"type": "picture"}
                }
            }),
            ExtractedContent::default(),
        );
        let payload = PayloadTransformer::new("AP").transform(&item);
        assert_eq!(payload.body.image_ids, vec!["c", "a"]);
    }

    #[test]
    fn transform_is_deterministic() {
        let item = resolved(
            json!({
                "altids": {"etag": "e"},
                "version": 4,
                "urgency": 2,
                "pubstatus": "usable",
                "type": "text"
            }),
            ExtractedContent {
                body_content_html: Some("<p>x</p>".to_string()),
                ..Default::default()
            },
        );
        let transformer = PayloadTransformer::new("AP");
        let first = transformer.transform(&item);
        assert_eq!(first, transformer.transform(&item));
        assert_eq!(first.body.version, "4");
        assert_eq!(first.body.priority, Some(2));
        assert_eq!(first.body.status.as_deref(), Some("usable"));
        assert_eq!(first.body.body_text.as_deref(), Some("<p>x</p>"));
    }
}
