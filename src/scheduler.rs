//! Periodic foreground runner for ingestion cycles.
//!
//! Stands in for an external timer: reads the active sources, runs one cycle
//! to completion, then waits for the next tick. Cycles never overlap.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::app::Result;
use crate::config::ScheduleConfig;
use crate::coordinator::{Coordinator, CycleReport};
use crate::store::Store;

/// Parse an interval such as `80s`, `5m`, `1h`, `1d` or bare seconds.
pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (digits, unit) = match s.char_indices().last() {
        Some((i, 'd')) => (&s[..i], 86_400),
        Some((i, 'h')) => (&s[..i], 3_600),
        Some((i, 'm')) => (&s[..i], 60),
        Some((i, 's')) => (&s[..i], 1),
        _ => (s.as_str(), 1),
    };

    let secs = digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(unit))
        .ok_or_else(|| format!("Invalid interval: {}. Use a format like '80s', '5m', '1h'", s))?;

    if secs == 0 {
        return Err("Interval must be at least one second".to_string());
    }
    Ok(secs)
}

pub fn format_interval(secs: u64) -> String {
    if secs >= 86_400 && secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs >= 3_600 && secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

pub struct Scheduler {
    coordinator: Arc<Coordinator>,
    interval: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(coordinator: Arc<Coordinator>, config: &ScheduleConfig) -> Self {
        Self {
            coordinator,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            run_on_start: config.run_on_start,
        }
    }

    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    /// One cycle over the sources active right now.
    pub async fn run_once(&self) -> Result<CycleReport> {
        let sources = self.coordinator.store().active_sources()?;
        Ok(self.coordinator.run_cycle(&sources).await)
    }

    /// Run until SIGINT or SIGTERM.
    pub async fn run(&self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves. A cycle in progress always finishes
    /// first.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            interval = %format_interval(self.interval.as_secs()),
            "Scheduler started"
        );

        if self.run_on_start {
            self.tick().await;
        }

        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = timer.tick() => self.tick().await,
            }
        }

        tracing::info!("Scheduler stopped");
        Ok(())
    }

    async fn tick(&self) {
        // A store failure costs this cycle only.
        if let Err(e) = self.run_once().await {
            tracing::error!(error = %e, "Failed to read feed sources");
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = tokio::signal::ctrl_c() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, listening for ctrl-c only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::domain::{Category, FeedSource};
    use crate::fetcher::HttpFetcher;
    use crate::normalizer::Normalizer;
    use crate::store::SqliteStore;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<rss version="2.0"><channel>
        <item><guid>s1</guid><title>Scheduled</title><link>https://example.com/s1</link></item>
    </channel></rss>"#;

    fn scheduler(run_on_start: bool) -> (Scheduler, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let fetcher = Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap());
        let coordinator = Arc::new(Coordinator::new(fetcher, store.clone(), Normalizer::new()));
        let config = ScheduleConfig {
            interval_secs: 3600,
            run_on_start,
        };
        (Scheduler::new(coordinator, &config), store)
    }

    async fn feed_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("80s").unwrap(), 80);
        assert_eq!(parse_interval("5m").unwrap(), 300);
        assert_eq!(parse_interval("1h").unwrap(), 3600);
        assert_eq!(parse_interval("1d").unwrap(), 86400);
        assert_eq!(parse_interval("80").unwrap(), 80);
        assert_eq!(parse_interval(" 2H ").unwrap(), 7200);
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("soon").is_err());
        assert!(parse_interval("").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(80), "80s");
        assert_eq!(format_interval(300), "5m");
        assert_eq!(format_interval(7200), "2h");
        assert_eq!(format_interval(86400), "1d");
    }

    #[tokio::test]
    async fn test_run_once_reads_active_sources() {
        let server = feed_server().await;
        let (scheduler, store) = scheduler(false);

        let url = format!("{}/rss", server.uri());
        store
            .add_source(&FeedSource::new("A", url.as_str(), Category::named("news")))
            .unwrap();
        store
            .add_source(&FeedSource::new("Gone", "http://127.0.0.1:9/rss", Category::named("news")))
            .unwrap();
        store.remove_source("http://127.0.0.1:9/rss").unwrap();

        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.dispatched, 1);
        assert_eq!(report.inserted, 1);
    }

    #[tokio::test]
    async fn test_initial_cycle_runs_before_shutdown() {
        let server = feed_server().await;
        let (scheduler, store) = scheduler(true);
        store
            .add_source(&FeedSource::new(
                "A",
                format!("{}/rss", server.uri()),
                Category::named("news"),
            ))
            .unwrap();

        scheduler.run_until(async {}).await.unwrap();

        assert!(store.find_item_by_key("s1").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_no_cycle_without_initial_run() {
        let server = feed_server().await;
        let (scheduler, store) = scheduler(false);
        store
            .add_source(&FeedSource::new(
                "A",
                format!("{}/rss", server.uri()),
                Category::named("news"),
            ))
            .unwrap();

        scheduler.run_until(async {}).await.unwrap();

        assert!(store.list_items(10).unwrap().is_empty());
    }
}
