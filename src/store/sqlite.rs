use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{AppError, Result};
use crate::domain::{Category, Enclosure, FeedSource, NormalizedItem, SubCategory};
use crate::store::Store;

const SOURCE_COLUMNS: &str = "id, name, url, site_url, category_name, category_style, \
     category_en_name, subcategory_name, subcategory_en_name, language, removed, created_at";

const ITEM_COLUMNS: &str = "id, key, title, content, link, published_at, category_name, \
     category_style, category_en_name, subcategory_name, subcategory_en_name, language, \
     source, enclosure_url, enclosure_type, clicks";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| AppError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            AppError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Fixed-width UTC timestamps so text ordering matches time ordering.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn row_to_source(row: &Row) -> rusqlite::Result<FeedSource> {
        let subcategory_name: Option<String> = row.get(7)?;
        let subcategory_en_name: Option<String> = row.get(8)?;

        Ok(FeedSource {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            site_url: row.get(3)?,
            category: Category {
                name: row.get(4)?,
                style_name: row.get(5)?,
                en_name: row.get(6)?,
            },
            subcategory: subcategory_name.map(|name| SubCategory {
                name,
                en_name: subcategory_en_name.unwrap_or_default(),
            }),
            language: row.get(9)?,
            removed: row.get(10)?,
            created_at: row
                .get::<_, String>(11)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn row_to_item(row: &Row) -> rusqlite::Result<NormalizedItem> {
        let subcategory_name: Option<String> = row.get(9)?;
        let subcategory_en_name: Option<String> = row.get(10)?;
        let enclosure_url: Option<String> = row.get(13)?;
        let enclosure_type: Option<String> = row.get(14)?;

        Ok(NormalizedItem {
            id: row.get(0)?,
            key: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            link: row.get(4)?,
            published_at: row
                .get::<_, Option<String>>(5)?
                .and_then(|s| Self::parse_datetime(&s)),
            category: Category {
                name: row.get(6)?,
                style_name: row.get(7)?,
                en_name: row.get(8)?,
            },
            subcategory: subcategory_name.map(|name| SubCategory {
                name,
                en_name: subcategory_en_name.unwrap_or_default(),
            }),
            language: row.get(11)?,
            source: row.get(12)?,
            enclosure: enclosure_url.map(|url| Enclosure {
                url,
                mime_type: enclosure_type,
            }),
            clicks: row.get(15)?,
        })
    }

    fn query_sources(&self, only_active: bool) -> Result<Vec<FeedSource>> {
        let conn = self.lock()?;
        let sql = if only_active {
            format!(
                "SELECT {} FROM sources WHERE removed = 0 ORDER BY id",
                SOURCE_COLUMNS
            )
        } else {
            format!("SELECT {} FROM sources ORDER BY id", SOURCE_COLUMNS)
        };

        let mut stmt = conn.prepare(&sql)?;
        let sources = stmt
            .query_map([], Self::row_to_source)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sources)
    }
}

impl Store for SqliteStore {
    /// Registers a source. Re-adding a removed url restores it with the new
    /// attributes.
    fn add_source(&self, source: &FeedSource) -> Result<i64> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO sources (name, url, site_url, category_name, category_style,
                 category_en_name, subcategory_name, subcategory_en_name, language, removed,
                 created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)
             ON CONFLICT(url) DO UPDATE SET
                 name = excluded.name,
                 site_url = excluded.site_url,
                 category_name = excluded.category_name,
                 category_style = excluded.category_style,
                 category_en_name = excluded.category_en_name,
                 subcategory_name = excluded.subcategory_name,
                 subcategory_en_name = excluded.subcategory_en_name,
                 language = excluded.language,
                 removed = 0",
            params![
                source.name,
                source.url,
                source.site_url,
                source.category.name,
                source.category.style_name,
                source.category.en_name,
                source.subcategory.as_ref().map(|s| s.name.as_str()),
                source.subcategory.as_ref().map(|s| s.en_name.as_str()),
                source.language,
                Self::format_datetime(&source.created_at),
            ],
        )?;

        let id = conn.query_row(
            "SELECT id FROM sources WHERE url = ?1",
            params![source.url],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn get_source_by_url(&self, url: &str) -> Result<Option<FeedSource>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE url = ?1", SOURCE_COLUMNS),
                params![url],
                Self::row_to_source,
            )
            .optional()?;

        Ok(result)
    }

    fn list_sources(&self) -> Result<Vec<FeedSource>> {
        self.query_sources(false)
    }

    fn active_sources(&self) -> Result<Vec<FeedSource>> {
        self.query_sources(true)
    }

    fn remove_source(&self, url: &str) -> Result<()> {
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE sources SET removed = 1 WHERE url = ?1 AND removed = 0",
            params![url],
        )?;
        if changed == 0 {
            return Err(AppError::SourceNotFound(url.to_string()));
        }

        Ok(())
    }

    fn find_item_by_key(&self, key: &str) -> Result<Option<NormalizedItem>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {} FROM items WHERE key = ?1", ITEM_COLUMNS),
                params![key],
                Self::row_to_item,
            )
            .optional()?;

        Ok(result)
    }

    fn find_item(&self, id: i64) -> Result<Option<NormalizedItem>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                Self::row_to_item,
            )
            .optional()?;

        Ok(result)
    }

    fn insert_item(&self, item: &NormalizedItem) -> Result<i64> {
        let conn = self.lock()?;
        let now = Self::format_datetime(&Utc::now());

        conn.execute(
            "INSERT INTO items (key, title, content, link, published_at, category_name,
                 category_style, category_en_name, subcategory_name, subcategory_en_name,
                 language, source, enclosure_url, enclosure_type, clicks, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
            params![
                item.key,
                item.title,
                item.content,
                item.link,
                item.published_at.as_ref().map(Self::format_datetime),
                item.category.name,
                item.category.style_name,
                item.category.en_name,
                item.subcategory.as_ref().map(|s| s.name.as_str()),
                item.subcategory.as_ref().map(|s| s.en_name.as_str()),
                item.language,
                item.source,
                item.enclosure.as_ref().map(|e| e.url.as_str()),
                item.enclosure.as_ref().and_then(|e| e.mime_type.as_deref()),
                item.clicks,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Replaces every stored field of the item with `id`.
    fn update_item(&self, id: i64, item: &NormalizedItem) -> Result<()> {
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE items SET key = ?1, title = ?2, content = ?3, link = ?4, published_at = ?5,
                 category_name = ?6, category_style = ?7, category_en_name = ?8,
                 subcategory_name = ?9, subcategory_en_name = ?10, language = ?11, source = ?12,
                 enclosure_url = ?13, enclosure_type = ?14, clicks = ?15, updated_at = ?16
             WHERE id = ?17",
            params![
                item.key,
                item.title,
                item.content,
                item.link,
                item.published_at.as_ref().map(Self::format_datetime),
                item.category.name,
                item.category.style_name,
                item.category.en_name,
                item.subcategory.as_ref().map(|s| s.name.as_str()),
                item.subcategory.as_ref().map(|s| s.en_name.as_str()),
                item.language,
                item.source,
                item.enclosure.as_ref().map(|e| e.url.as_str()),
                item.enclosure.as_ref().and_then(|e| e.mime_type.as_deref()),
                item.clicks,
                Self::format_datetime(&Utc::now()),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(AppError::ItemNotFound(id));
        }

        Ok(())
    }

    fn list_items(&self, limit: usize) -> Result<Vec<NormalizedItem>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM items
             ORDER BY published_at IS NULL, published_at DESC, id DESC
             LIMIT ?1",
            ITEM_COLUMNS
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let items = stmt
            .query_map(params![limit], Self::row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn record_click(&self, id: i64) -> Result<i64> {
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE items SET clicks = clicks + 1 WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Err(AppError::ItemNotFound(id));
        }

        let clicks = conn.query_row(
            "SELECT clicks FROM items WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        Ok(clicks)
    }
}
