//! One ingestion cycle: fetch every source concurrently, then normalize and
//! resolve each document as its result arrives.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::domain::{FeedDocument, FeedSource};
use crate::fetcher::{FetchError, Fetcher};
use crate::normalizer::Normalizer;
use crate::resolver::{resolve, Resolution};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dispatching,
    Collecting,
    Done,
}

/// Tally of one cycle. `succeeded + failed == dispatched` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Items dropped by normalization or by a store error.
    pub skipped: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} feeds ({} ok, {} failed): {} new, {} updated, {} skipped",
            self.dispatched, self.succeeded, self.failed, self.inserted, self.updated, self.skipped
        )
    }
}

/// What a fetch task reports back. Exactly one per dispatched source.
struct FeedOutcome {
    source: FeedSource,
    result: Result<FeedDocument, FetchError>,
    elapsed: Duration,
}

pub struct Coordinator {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    store: Arc<dyn Store + Send + Sync>,
    normalizer: Normalizer,
}

impl Coordinator {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<dyn Store + Send + Sync>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            fetcher,
            store,
            normalizer,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store + Send + Sync> {
        &self.store
    }

    /// Run one cycle over `sources`. Feed and item failures are logged and
    /// counted; the cycle always completes.
    pub async fn run_cycle(&self, sources: &[FeedSource]) -> CycleReport {
        let started = Instant::now();
        let mut phase = Phase::Idle;
        let mut report = CycleReport::default();

        let sources: Vec<FeedSource> = sources
            .iter()
            .filter(|s| s.is_dispatchable())
            .cloned()
            .collect();
        let expected = sources.len();
        report.dispatched = expected;
        tracing::info!(feeds = expected, "Starting cycle");

        self.transition(&mut phase, Phase::Dispatching);
        let (tx, mut rx) = mpsc::channel::<FeedOutcome>(expected.max(1));
        for source in sources {
            let tx = tx.clone();
            let fetcher = self.fetcher.clone();
            tokio::spawn(async move {
                let begin = Instant::now();
                let result = fetcher.fetch(&source.url).await;
                let outcome = FeedOutcome {
                    source,
                    result,
                    elapsed: begin.elapsed(),
                };
                // The receiver outlives every sender unless the cycle itself was dropped.
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        self.transition(&mut phase, Phase::Collecting);
        let mut observed = 0;
        while observed < expected {
            match rx.recv().await {
                Some(outcome) => {
                    observed += 1;
                    self.ingest(outcome, &mut report);
                }
                None => {
                    // A task died without reporting.
                    let missing = expected - observed;
                    tracing::error!(missing, "Fetch tasks ended without a result");
                    report.failed += missing;
                    observed = expected;
                }
            }
        }
        rx.close();

        self.transition(&mut phase, Phase::Done);
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cycle complete: {}",
            report
        );
        report
    }

    fn transition(&self, phase: &mut Phase, next: Phase) {
        tracing::debug!(from = ?phase, to = ?next, "Cycle phase");
        *phase = next;
    }

    fn ingest(&self, outcome: FeedOutcome, report: &mut CycleReport) {
        let FeedOutcome {
            source,
            result,
            elapsed,
        } = outcome;

        let doc = match result {
            Ok(doc) => doc,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    feed = %source.display_name(),
                    url = %source.url,
                    error = %e,
                    "Feed failed"
                );
                return;
            }
        };
        report.succeeded += 1;

        let considered = doc.items.len().min(crate::normalizer::ITEM_LIMIT);
        let items = self.normalizer.normalize(&source, &doc);
        report.skipped += considered - items.len();

        let mut inserted = 0;
        for item in items {
            let key = item.key.clone();
            match resolve(self.store.as_ref(), item) {
                Ok(Resolution::Inserted(_)) => {
                    inserted += 1;
                    report.inserted += 1;
                }
                Ok(Resolution::Updated(_)) => report.updated += 1,
                Err(e) => {
                    report.skipped += 1;
                    tracing::error!(
                        feed = %source.display_name(),
                        key = %key,
                        error = %e,
                        "Failed to store item"
                    );
                }
            }
        }

        tracing::info!(
            feed = %source.display_name(),
            new = inserted,
            elapsed_ms = elapsed.as_millis() as u64,
            "Feed ingested"
        );
    }
}
