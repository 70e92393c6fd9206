use crate::types::ExtractedContent;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

/// `id` of the element carrying the primary headline.
pub const HEADLINE_ID: &str = "headline";

const ISSUE_DATE_TAG: &[u8] = b"date.issue";
const ED_MSG_TAG: &[u8] = b"ed-msg";
const BYLINE_TAG: &[u8] = b"byline";
const ABSTRACT_TAG: &[u8] = b"abstract";
const BODY_CONTENT_TAG: &[u8] = b"body.content";
const BLOCK_TAG: &[u8] = b"block";
const SUBHEAD_TAG: &[u8] = b"hl2";
const MEDIA_REFERENCE_TAG: &[u8] = b"media-reference";

/// Subheadings are written out under this tag.
const HEADING_TAG: &str = "h1";

/// Pulls the known fields out of a NITF-style rendition document.
///
/// Unknown tags are ignored. Malformed markup stops the walk and whatever was
/// collected up to that point is returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, document: &str) -> ExtractedContent {
        debug!("Extracting content ({} bytes)", document.len());

        let mut reader = Reader::from_str(document);
        let mut walk = Walk::default();

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => walk.start(&e),
                Ok(Event::End(e)) => walk.end(&e),
                Ok(Event::Empty(e)) => walk.empty(&e),
                Ok(Event::Text(t)) => walk.text(&t),
                Ok(Event::CData(c)) => {
                    let raw = String::from_utf8_lossy(&c);
                    walk.append_text(&raw, &format!("<![CDATA[{}]]>", raw));
                }
                Ok(Event::Comment(c)) => {
                    if let Some(block) = walk.block.as_mut() {
                        block.push_raw(&format!("<!--{}-->", String::from_utf8_lossy(&c)));
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Stopping document walk at byte {}: {}", reader.buffer_position(), e);
                    break;
                }
            }
        }

        walk.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Byline,
    Headline,
    Abstract,
}

#[derive(Debug)]
struct TextCapture {
    field: TextField,
    depth: usize,
    text: String,
}

/// Markup of one body block, minus the block element itself.
#[derive(Debug, Default)]
struct BlockCapture {
    depth: usize,
    skip: usize,
    html: String,
}

impl BlockCapture {
    fn start(&mut self, e: &BytesStart) {
        self.depth += 1;
        if self.skip > 0 {
            self.skip += 1;
        } else if e.local_name().as_ref() == MEDIA_REFERENCE_TAG {
            self.skip = 1;
        } else {
            self.html.push_str(&open_tag(e, ">"));
        }
    }

    /// Returns true when this end tag closes the block itself.
    fn end(&mut self, e: &BytesEnd) -> bool {
        if self.depth == 0 {
            return true;
        }
        self.depth -= 1;
        if self.skip > 0 {
            self.skip -= 1;
        } else {
            let name = output_name(e.local_name().as_ref(), e.name().as_ref());
            self.html.push_str(&format!("</{}>", name));
        }
        false
    }

    fn empty(&mut self, e: &BytesStart) {
        if self.skip == 0 && e.local_name().as_ref() != MEDIA_REFERENCE_TAG {
            self.html.push_str(&open_tag(e, "/>"));
        }
    }

    fn push_raw(&mut self, raw: &str) {
        if self.skip == 0 {
            self.html.push_str(raw);
        }
    }

    fn into_fragment(self) -> String {
        self.html.lines().map(str::trim).collect()
    }
}

fn output_name(local: &[u8], qualified: &[u8]) -> String {
    if local == SUBHEAD_TAG {
        HEADING_TAG.to_string()
    } else {
        String::from_utf8_lossy(qualified).into_owned()
    }
}

/// Start tag with its raw attributes; `close` is `>` or `/>`.
fn open_tag(e: &BytesStart, close: &str) -> String {
    format!(
        "<{}{}{}",
        output_name(e.local_name().as_ref(), e.name().as_ref()),
        String::from_utf8_lossy(e.attributes_raw()),
        close
    )
}

fn attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

#[derive(Debug, Default)]
struct Walk {
    out: ExtractedContent,
    text: Option<TextCapture>,
    block: Option<BlockCapture>,
    // nesting depth inside body.content, 0 when outside
    body_depth: usize,
    blocks: Vec<String>,
}

impl Walk {
    fn start(&mut self, e: &BytesStart) {
        self.attributes(e);

        match self.text.as_mut() {
            Some(capture) => capture.depth += 1,
            None => {
                if let Some(field) = self.text_field(e) {
                    self.text = Some(TextCapture { field, depth: 1, text: String::new() });
                }
            }
        }

        match self.block.as_mut() {
            Some(block) => block.start(e),
            None if self.body_depth > 0 && e.local_name().as_ref() == BLOCK_TAG => {
                self.block = Some(BlockCapture::default());
            }
            None => {}
        }

        if self.body_depth > 0 {
            self.body_depth += 1;
        } else if e.local_name().as_ref() == BODY_CONTENT_TAG {
            self.body_depth = 1;
        }
    }

    fn end(&mut self, e: &BytesEnd) {
        if let Some(capture) = self.text.as_mut() {
            capture.depth -= 1;
            if capture.depth == 0 {
                if let Some(capture) = self.text.take() {
                    self.store_text(capture);
                }
            }
        }

        if let Some(block) = self.block.as_mut() {
            if block.end(e) {
                if let Some(block) = self.block.take() {
                    self.blocks.push(block.into_fragment());
                }
            }
        }

        self.body_depth = self.body_depth.saturating_sub(1);
    }

    fn empty(&mut self, e: &BytesStart) {
        self.attributes(e);

        match self.block.as_mut() {
            Some(block) => block.empty(e),
            None if self.body_depth > 0 && e.local_name().as_ref() == BLOCK_TAG => {
                self.blocks.push(String::new());
            }
            None => {}
        }
    }

    fn text(&mut self, t: &BytesText) {
        let raw = String::from_utf8_lossy(t);
        let unescaped = t.unescape().map(|s| s.into_owned()).unwrap_or_else(|_| raw.to_string());
        self.append_text(&unescaped, &raw);
    }

    /// `text` goes to field captures, `raw` into block markup.
    fn append_text(&mut self, text: &str, raw: &str) {
        if let Some(capture) = self.text.as_mut() {
            capture.text.push_str(text);
        }
        if let Some(block) = self.block.as_mut() {
            block.push_raw(raw);
        }
    }

    fn attributes(&mut self, e: &BytesStart) {
        let name = e.local_name();
        if name.as_ref() == ISSUE_DATE_TAG && self.out.issue_date.is_none() {
            self.out.issue_date = attribute(e, "norm");
        } else if name.as_ref() == ED_MSG_TAG && self.out.ed_message.is_none() {
            self.out.ed_message = attribute(e, "info");
        }
    }

    fn text_field(&self, e: &BytesStart) -> Option<TextField> {
        let field = if attribute(e, "id").as_deref() == Some(HEADLINE_ID) {
            TextField::Headline
        } else {
            match e.local_name().as_ref() {
                BYLINE_TAG => TextField::Byline,
                ABSTRACT_TAG => TextField::Abstract,
                _ => return None,
            }
        };

        let taken = match field {
            TextField::Byline => self.out.byline.is_some(),
            TextField::Headline => self.out.headline.is_some(),
            TextField::Abstract => self.out.summary.is_some(),
        };
        (!taken).then_some(field)
    }

    fn store_text(&mut self, capture: TextCapture) {
        let text = capture.text.trim();
        if text.is_empty() {
            return;
        }
        let slot = match capture.field {
            TextField::Byline => &mut self.out.byline,
            TextField::Headline => &mut self.out.headline,
            TextField::Abstract => &mut self.out.summary,
        };
        *slot = Some(text.to_string());
    }

    fn finish(mut self) -> ExtractedContent {
        if !self.blocks.is_empty() {
            self.out.body_content_html = Some(self.blocks.concat());
        }
        self.out
    }
}
