use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Category, Enclosure, SubCategory};

/// The persisted record for one logical feed item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedItem {
    /// Store-assigned identifier; `None` until the item has been inserted.
    pub id: Option<i64>,
    /// Durable dedup key, scheme-stripped.
    pub key: String,
    pub title: String,
    pub content: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Category,
    pub subcategory: Option<SubCategory>,
    pub language: String,
    pub source: String,
    pub enclosure: Option<Enclosure>,
    pub clicks: i64,
}

impl NormalizedItem {
    /// A stored date counts only if it is set and after the epoch.
    pub fn has_valid_date(&self) -> bool {
        self.published_at.is_some_and(|dt| dt.timestamp() > 0)
    }
}

/// Strip exactly one leading `http://` or `https://` from identifiers longer
/// than three characters.
pub fn normalize_key(raw: &str) -> String {
    if raw.chars().count() <= 3 {
        return raw.to_string();
    }
    raw.strip_prefix("http://")
        .or_else(|| raw.strip_prefix("https://"))
        .unwrap_or(raw)
        .to_string()
}
