use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::config::FetchConfig;
use crate::domain::FeedDocument;
use crate::fetcher::{FetchError, Fetcher};
use crate::parser;

/// Fetcher over one long-lived reqwest client, built once at startup.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .tcp_keepalive(config.keepalive())
            .read_timeout(config.read_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FeedDocument, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        let mut doc = parser::parse(&body)?;
        if doc.link.trim().is_empty() {
            doc.link = url.to_string();
        }
        doc.update_url = url.to_string();

        tracing::debug!(url, items = doc.items.len(), "Fetched feed");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><guid>1</guid><title>Test</title><link>https://example.com/1</link></item>
</channel></rss>"#;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_sets_link_and_update_url() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let doc = fetcher().fetch(&url).await.unwrap();

        assert_eq!(doc.items.len(), 1);
        // channel has no <link>, so the fetch url stands in
        assert_eq!(doc.link, url);
        assert_eq!(doc.update_url, url);
    }

    #[tokio::test]
    async fn test_fetch_keeps_channel_link() {
        let body = VALID_RSS.replace("<channel>", "<channel><link>https://site.example/</link>");
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let doc = fetcher().fetch(&url).await.unwrap();
        assert_eq!(doc.link, "https://site.example/");
        assert_eq!(doc.update_url, url);
    }

    #[tokio::test]
    async fn test_fetch_404_is_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let result = fetcher()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await;
        match result {
            Err(FetchError::Http(e)) => {
                assert_eq!(e.status().map(|s| s.as_u16()), Some(404));
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_feed_is_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let result = fetcher()
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let config = FetchConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        let result = fetcher
            .fetch(&format!("{}/feed", mock_server.uri()))
            .await;

        match result {
            Err(FetchError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let result = fetcher().fetch("http://127.0.0.1:9/feed").await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
