/// Describes one news wire: where its feed starts and how its items are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireSource {
    pub feed_tag: String,
    pub default_feed_url: String,
    /// Appended to every continuation URL so the next page carries all optional fields.
    pub cursor_suffix: String,
    pub api_key_header: String,
    pub rendition_format: String,
}

impl WireSource {
    /// Associated Press media API feed
    pub fn associated_press() -> Self {
        Self {
            feed_tag: "AP".to_string(),
            default_feed_url: "https://api.ap.org/media/v/content/feed?in_my_plan=true".to_string(),
            cursor_suffix: "&include=*".to_string(),
            api_key_header: "x-api-key".to_string(),
            rendition_format: "nitf".to_string(),
        }
    }

    pub fn with_feed_url(mut self, url: impl Into<String>) -> Self {
        self.default_feed_url = url.into();
        self
    }

    /// Cursor to hand back to the caller after a successful page.
    pub fn next_cursor(&self, next_page: Option<&str>) -> String {
        let base = next_page
            .filter(|page| !page.is_empty())
            .unwrap_or(&self.default_feed_url);
        format!("{}{}", base, self.cursor_suffix)
    }

    /// An empty caller cursor means "start of feed".
    pub fn start_cursor<'a>(&'a self, cursor: &'a str) -> &'a str {
        if cursor.trim().is_empty() {
            &self.default_feed_url
        } else {
            cursor
        }
    }
}

impl Default for WireSource {
    fn default() -> Self {
        Self::associated_press()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_cursor_appends_suffix() {
        let source = WireSource::associated_press();
        assert_eq!(
            source.next_cursor(Some("https://api.ap.org/media/v/content/feed?qt=abc")),
            "https://api.ap.org/media/v/content/feed?qt=abc&include=*"
        );
    }

    #[test]
    fn next_cursor_falls_back_to_start_of_feed() {
        let source = WireSource::associated_press().with_feed_url("http://localhost/feed?x=1");
        assert_eq!(source.next_cursor(None), "http://localhost/feed?x=1&include=*");
        assert_eq!(source.next_cursor(Some("")), "http://localhost/feed?x=1&include=*");
    }

    #[test]
    fn empty_cursor_starts_from_default() {
        let source = WireSource::associated_press();
        assert_eq!(source.start_cursor("  "), source.default_feed_url);
        assert_eq!(source.start_cursor("http://c"), "http://c");
    }
}
