//! Production [`Fetch`] implementation: one network round trip per call,
//! user-agent rotation, denial-banner detection.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::contract::Fetch;
use crate::document::Document;
use crate::error::ScrapeError;
use crate::tables::ClassificationTables;

/// Heading text the host renders on its anti-scraping block page.
pub const DENIAL_MARKER: &str = "Whoa there!";

/// Fetches a URL with a pseudo-randomly selected user agent and parses the
/// body. A response carrying the denial banner fails with
/// [`ScrapeError::DeniedRequest`]; no retry happens here; retry policy is
/// the caller's.
pub struct RequestGateway {
    client: reqwest::Client,
    tables: Arc<ClassificationTables>,
}

impl RequestGateway {
    pub fn new(tables: Arc<ClassificationTables>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tables,
        }
    }

    /// Reject a parsed page whose top-level heading is the denial banner.
    /// Split out so the screen is testable without a network round trip.
    pub fn screen(document: Document, url: &str) -> Result<Document, ScrapeError> {
        let denied = document
            .texts("h1", "")
            .iter()
            .any(|h| h == DENIAL_MARKER);
        if denied {
            warn!(url, "host denied the request");
            return Err(ScrapeError::DeniedRequest {
                url: url.to_string(),
            });
        }
        Ok(document)
    }
}

#[async_trait]
impl Fetch for RequestGateway {
    async fn fetch(&self, url: &str) -> Result<Document, ScrapeError> {
        let user_agent = self.tables.random_user_agent();
        debug!(url, user_agent, "fetching page");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                url: url.to_string(),
                source,
            })?;

        let body = response.text().await.map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })?;

        Self::screen(Document::parse(body), url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_banner_is_rejected_with_url() {
        let doc = Document::parse("<html><h1>Whoa there!</h1></html>");
        let err = RequestGateway::screen(doc, "https://example.com/x").unwrap_err();
        match err {
            ScrapeError::DeniedRequest { url } => assert_eq!(url, "https://example.com/x"),
            other => panic!("expected DeniedRequest, got {other:?}"),
        }
    }

    #[test]
    fn ordinary_page_passes_the_screen() {
        let doc = Document::parse("<html><h1>A repo</h1></html>");
        assert!(RequestGateway::screen(doc, "https://example.com/y").is_ok());
    }
}
