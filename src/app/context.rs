use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{AppError, Result};
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::normalizer::Normalizer;
use crate::scheduler::Scheduler;
use crate::store::sqlite::SqliteStore;

/// Long-lived components, built once at startup and shared by reference.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub coordinator: Arc<Coordinator>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.store.path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        tracing::debug!(path = %db_path.display(), "Opened store");
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(SqliteStore::in_memory()?))
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        let coordinator = Arc::new(Coordinator::new(
            fetcher,
            store.clone(),
            Normalizer::new(),
        ));

        Ok(Self {
            config,
            store,
            coordinator,
        })
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.coordinator.clone(), &self.config.schedule)
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| AppError::Other("Could not find data directory".into()))?;
        let app_dir = data_dir.join("rssfetcher");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("rssfetcher.db"))
    }
}
