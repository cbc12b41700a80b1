pub mod sqlite;

use crate::app::Result;
use crate::domain::{FeedSource, NormalizedItem};

pub use sqlite::SqliteStore;

/// Persistence seam for the pipeline. Sources are owned by the feed
/// administration side; items are written by the resolver.
pub trait Store {
    // Source operations
    fn add_source(&self, source: &FeedSource) -> Result<i64>;
    fn get_source_by_url(&self, url: &str) -> Result<Option<FeedSource>>;
    fn list_sources(&self) -> Result<Vec<FeedSource>>;
    fn active_sources(&self) -> Result<Vec<FeedSource>>;
    fn remove_source(&self, url: &str) -> Result<()>;

    // Item operations
    fn find_item_by_key(&self, key: &str) -> Result<Option<NormalizedItem>>;
    fn find_item(&self, id: i64) -> Result<Option<NormalizedItem>>;
    fn insert_item(&self, item: &NormalizedItem) -> Result<i64>;
    fn update_item(&self, id: i64, item: &NormalizedItem) -> Result<()>;
    fn list_items(&self, limit: usize) -> Result<Vec<NormalizedItem>>;
    fn record_click(&self, id: i64) -> Result<i64>;
}
