//! # rssfetcher
//!
//! Periodic ingestion of RSS 2.0, RSS 1.0 and Atom feeds into a local item
//! store.
//!
//! ## Architecture
//!
//! Every cycle runs the same pipeline once per active source:
//!
//! ```text
//! Fetcher → Sniffer/Parser → Normalizer → Resolver → Store
//! ```
//!
//! - [`fetcher`]: one shared HTTP client with bounded timeouts
//! - [`parser`]: format detection and the three feed parsers
//! - [`normalizer`]: trims, stamps and caps items per source
//! - [`resolver`]: insert-or-update by durable key
//! - [`coordinator`]: concurrent fan-out of fetches, fan-in of results
//!
//! ## Quick Start
//!
//! ```bash
//! # Register a source
//! rssfetcher add https://blog.rust-lang.org/feed.xml --name "Rust Blog" --category tech
//!
//! # Run one cycle
//! rssfetcher update
//!
//! # Keep running every 80 seconds
//! rssfetcher run --interval 80s
//!
//! # Show what was stored
//! rssfetcher items --limit 10
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// config, store, fetcher, coordinator.
pub mod app;

/// Command-line interface using clap.
///
/// - `add <url>` - Register a source
/// - `remove <url>` - Stop fetching a source
/// - `sources [--all]` - List sources
/// - `items [--limit N] [--json]` - List stored items
/// - `update` - Run one cycle
/// - `run [--interval I]` - Run cycles periodically
pub mod cli;

/// Configuration loaded from `~/.config/rssfetcher/config.toml`.
pub mod config;

/// Fan-out/fan-in of one ingestion cycle.
pub mod coordinator;

/// Core domain models.
///
/// - [`FeedSource`](domain::FeedSource): a configured subscription
/// - [`FeedDocument`](domain::FeedDocument): parser output
/// - [`NormalizedItem`](domain::NormalizedItem): the persisted record
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

pub mod normalizer;

/// Feed format sniffing and parsing.
pub mod parser;

pub mod resolver;

/// Periodic cycle runner with graceful shutdown.
pub mod scheduler;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
