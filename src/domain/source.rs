use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category reference entity. Owned by the feed administration side; the
/// ingestion pipeline only stamps it onto items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub style_name: String,
    pub en_name: String,
}

impl Category {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub name: String,
    pub en_name: String,
}

impl SubCategory {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A configured subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub site_url: Option<String>,
    pub category: Category,
    pub subcategory: Option<SubCategory>,
    pub language: String,
    pub removed: bool,
    pub created_at: DateTime<Utc>,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, category: Category) -> Self {
        Self {
            id: 0,
            name: name.into(),
            url: url.into(),
            site_url: None,
            category,
            subcategory: None,
            language: String::new(),
            removed: false,
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }

    /// Sources with a blank url are never dispatched.
    pub fn is_dispatchable(&self) -> bool {
        !self.removed && !self.url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_url() {
        let source = FeedSource::new("", "https://example.com/rss", Category::named("news"));
        assert_eq!(source.display_name(), "https://example.com/rss");

        let source = FeedSource::new("Example", "https://example.com/rss", Category::named("news"));
        assert_eq!(source.display_name(), "Example");
    }

    #[test]
    fn test_blank_or_removed_sources_are_not_dispatchable() {
        let mut source = FeedSource::new("Example", "  ", Category::named("news"));
        assert!(!source.is_dispatchable());

        source.url = "https://example.com/rss".into();
        assert!(source.is_dispatchable());

        source.removed = true;
        assert!(!source.is_dispatchable());
    }
}
