//! Insert-or-update of normalized items keyed by their durable key.

use crate::app::{AppError, Result};
use crate::domain::NormalizedItem;
use crate::store::Store;

/// Outcome of resolving one item against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Inserted(i64),
    Updated(i64),
}

impl Resolution {
    pub fn id(&self) -> i64 {
        match self {
            Resolution::Inserted(id) | Resolution::Updated(id) => *id,
        }
    }
}

/// Upsert `item` by key. On a hit the stored identifier and click counter
/// carry over, and a valid stored publish date wins over the parsed one.
pub fn resolve<S: Store + ?Sized>(store: &S, mut item: NormalizedItem) -> Result<Resolution> {
    match store.find_item_by_key(&item.key)? {
        Some(existing) => {
            let id = existing.id.ok_or_else(|| {
                AppError::Other(format!("Stored item {} has no identifier", item.key))
            })?;

            item.id = Some(id);
            if existing.has_valid_date() {
                item.published_at = existing.published_at;
            }
            item.clicks = existing.clicks;

            store.update_item(id, &item)?;
            Ok(Resolution::Updated(id))
        }
        None => {
            let id = store.insert_item(&item)?;
            Ok(Resolution::Inserted(id))
        }
    }
}
