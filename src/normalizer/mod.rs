use chrono::{DateTime, Utc};

use crate::domain::{normalize_key, FeedDocument, FeedSource, NormalizedItem, RawItem};

/// Items taken from the head of each feed per cycle.
pub const ITEM_LIMIT: usize = 5;

/// Turns parsed items into store records for one source.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, source: &FeedSource, doc: &FeedDocument) -> Vec<NormalizedItem> {
        self.normalize_at(source, doc, Utc::now())
    }

    /// Normalize against a fixed clock. Only the first [`ITEM_LIMIT`] items
    /// of the document are considered, in document order.
    pub fn normalize_at(
        &self,
        source: &FeedSource,
        doc: &FeedDocument,
        now: DateTime<Utc>,
    ) -> Vec<NormalizedItem> {
        doc.items
            .iter()
            .take(ITEM_LIMIT)
            .filter_map(|raw| self.normalize_item(source, raw, now))
            .collect()
    }

    /// Returns `None` when the trimmed title or link is empty.
    pub fn normalize_item(
        &self,
        source: &FeedSource,
        raw: &RawItem,
        now: DateTime<Utc>,
    ) -> Option<NormalizedItem> {
        let title = raw.title.trim();
        let link = raw.link.trim();
        if title.is_empty() || link.is_empty() {
            tracing::warn!(
                feed = %source.display_name(),
                guid = %raw.guid,
                "Item has an empty title or link, skipping"
            );
            return None;
        }

        let published_at = raw.published.map(|dt| if dt > now { now } else { dt });

        Some(NormalizedItem {
            id: None,
            key: normalize_key(raw.guid.trim()),
            title: title.to_string(),
            content: raw.content.trim().to_string(),
            link: link.to_string(),
            published_at,
            category: source.category.clone(),
            subcategory: source.subcategory.clone(),
            language: source.language.clone(),
            source: source.display_name().to_string(),
            enclosure: raw.enclosure.clone(),
            clicks: 0,
        })
    }
}
