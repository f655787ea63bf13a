//! Content Items
//!
//! Immutable values produced by the external fetchers and rotated through by
//! the bubble's [`Carousel`](crate::carousel::Carousel).

use serde::{Deserialize, Serialize};

/// Maximum number of items kept from a single fetch
pub const MAX_ITEMS: usize = 30;

/// A single piece of content shown in the speech bubble
///
/// Items have no identity beyond structural equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentItem {
    /// Headline
    pub title: String,
    /// Body text
    pub description: String,
    /// External link (may be empty)
    pub link: String,
    /// Thumbnail image URL (may be empty)
    pub thumbnail_url: String,
    /// Display label for where the item came from (may be empty)
    pub source: String,
}

impl ContentItem {
    /// Create an item with only a title and description
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Set the link
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the thumbnail URL
    #[must_use]
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = url.into();
        self
    }

    /// Set the source label
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// The synthetic item shown when there is nothing else to show
    pub fn welcome() -> Self {
        Self::new(
            "Welcome to your desktop companion",
            "The companion is up and running. Configure a feed in the settings to see articles here.",
        )
        .with_source("companion")
    }

    /// Text projected onto the bubble surface
    ///
    /// Title, then the description and the source label, each separated by a
    /// blank line and omitted when empty.
    pub fn display_text(&self) -> String {
        let mut text = self.title.clone();
        if !self.description.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.description);
        }
        if !self.source.is_empty() {
            text.push_str("\n\nsource: ");
            text.push_str(&self.source);
        }
        text
    }

    /// Text handed to the speech synthesizer
    pub fn speech_text(&self) -> String {
        format!("{}。{}", self.title, self.description)
    }

    /// Thumbnail URL if one is set
    pub fn thumbnail(&self) -> Option<&str> {
        (!self.thumbnail_url.is_empty()).then_some(self.thumbnail_url.as_str())
    }
}

/// Normalize a freshly fetched item list
///
/// Trims surrounding whitespace from every field and keeps at most
/// [`MAX_ITEMS`] entries. An empty result stays empty; the carousel decides
/// what to show in that case.
pub fn normalize(items: Vec<ContentItem>) -> Vec<ContentItem> {
    items
        .into_iter()
        .take(MAX_ITEMS)
        .map(|item| ContentItem {
            title: item.title.trim().to_string(),
            description: item.description.trim().to_string(),
            link: item.link.trim().to_string(),
            thumbnail_url: item.thumbnail_url.trim().to_string(),
            source: item.source.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_text_full() {
        let item = ContentItem::new("Title", "Body").with_source("Feed");
        assert_eq!(item.display_text(), "Title\n\nBody\n\nsource: Feed");
    }

    #[test]
    fn test_display_text_omits_empty_parts() {
        let item = ContentItem::new("Only title", "");
        assert_eq!(item.display_text(), "Only title");

        let item = ContentItem::new("Title", "").with_source("Feed");
        assert_eq!(item.display_text(), "Title\n\nsource: Feed");
    }

    #[test]
    fn test_thumbnail_only_when_set() {
        assert_eq!(ContentItem::new("a", "b").thumbnail(), None);
        let item = ContentItem::new("a", "b").with_thumbnail("http://img/1.png");
        assert_eq!(item.thumbnail(), Some("http://img/1.png"));
    }

    #[test]
    fn test_normalize_trims_and_caps() {
        let items: Vec<ContentItem> = (0..40)
            .map(|i| ContentItem::new(format!("  item {i} "), " body\n"))
            .collect();

        let normalized = normalize(items);
        assert_eq!(normalized.len(), MAX_ITEMS);
        assert_eq!(normalized[0].title, "item 0");
        assert_eq!(normalized[0].description, "body");
    }

    #[test]
    fn test_speech_text() {
        let item = ContentItem::new("Hello", "World");
        assert_eq!(item.speech_text(), "Hello。World");
    }
}
