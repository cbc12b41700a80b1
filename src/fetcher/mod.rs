pub mod http_fetcher;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::FeedDocument;
use crate::parser::ParseError;

pub use http_fetcher::HttpFetcher;

/// Feed-scoped failure: aborts the one feed, never the cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS, timeout, non-2xx status or body read failure.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

#[async_trait]
pub trait Fetcher {
    /// Retrieve and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<FeedDocument, FetchError>;
}
