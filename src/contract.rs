//! # External collaborator contracts
//!
//! Two primitives are consumed but not owned by this crate: the
//! fetch-and-parse round trip and the rendering environment for pages whose
//! listing only exists after client-side scripts run. Both are expressed as
//! async traits so that production code, alternative backends and test mocks
//! are interchangeable.
//!
//! The traits are annotated for `mockall`; with the default
//! `test-export-mocks` feature, `MockFetch` and `MockDynamicFetch` are
//! available to dependents' test suites.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;

use crate::document::Document;
use crate::error::ScrapeError;

/// One fetch-and-parse cycle: GET the URL, hand back the parsed page.
///
/// Implementors decide user-agent policy and denial detection; see
/// [`RequestGateway`](crate::gateway::RequestGateway) for the production
/// implementation. Errors abort the calling scrape step; retry policy
/// belongs to the caller.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Document, ScrapeError>;
}

/// Rendering-environment contract for dynamically loaded listings.
///
/// Waits up to `timeout` for elements matching `locator` (format:
/// `"tag.class tokens"`) to appear on the page and returns their text
/// content. Absence is a *soft* failure: a timeout or an empty match set
/// yields `Ok(vec![])`, degrading to "no files found" rather than aborting
/// the enclosing scrape.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DynamicFetch: Send + Sync {
    async fn wait_for_elements(
        &self,
        url: &str,
        locator: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, ScrapeError>;
}
