use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media attachment of an item, usually an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: Option<String>,
}

impl Enclosure {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedImage {
    pub title: String,
    pub url: String,
    pub height: u32,
    pub width: u32,
}

/// One parsed entry, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub title: String,
    pub content: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// GUID for RSS, `id` for Atom. RSS falls back to the link.
    pub guid: String,
    pub enclosure: Option<Enclosure>,
    pub thumbnails: Vec<String>,
}

/// Parser output for a single fetch.
#[derive(Debug, Clone, Default)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    pub link: String,
    /// The url the document was fetched from. Diagnostics only.
    pub update_url: String,
    pub image: Option<FeedImage>,
    pub items: Vec<RawItem>,
    pub updated: Option<DateTime<Utc>>,
    /// Number of items accepted by the parser.
    pub unread: u32,
}

impl FeedDocument {
    pub fn image_url(&self) -> Option<&str> {
        self.image
            .as_ref()
            .map(|image| image.url.as_str())
            .filter(|url| !url.is_empty())
    }
}
