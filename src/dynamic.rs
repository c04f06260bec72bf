//! Fallback [`DynamicFetch`] implementation over the static markup.
//!
//! A browser-driven implementor belongs outside this crate (the rendering
//! environment is an external collaborator); this one covers hosts that
//! server-render the listing, by fetching the page once through [`Fetch`]
//! and extracting locator matches. Absence of matches is a soft failure:
//! it returns the empty list, which downstream treats as "no files found".

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::contract::{DynamicFetch, Fetch};
use crate::error::ScrapeError;

/// Locator grammar shared with browser-backed implementors:
/// `"tag.class tokens"`.
pub fn split_locator(locator: &str) -> (&str, &str) {
    locator.split_once('.').unwrap_or((locator, ""))
}

pub struct StaticListingFetcher<F> {
    fetcher: F,
}

impl<F: Fetch> StaticListingFetcher<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: Fetch> DynamicFetch for StaticListingFetcher<F> {
    async fn wait_for_elements(
        &self,
        url: &str,
        locator: &str,
        _timeout: Duration,
    ) -> Result<Vec<String>, ScrapeError> {
        let (tag, class) = split_locator(locator);
        let document = self.fetcher.fetch(url).await?;
        let texts = document.texts(tag, class);
        debug!(url, locator, matches = texts.len(), "static listing scan");
        Ok(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockFetch;
    use crate::document::Document;

    #[tokio::test]
    async fn extracts_locator_matches_from_static_markup() {
        let mut fetch = MockFetch::new();
        fetch.expect_fetch().returning(|_| {
            Ok(Document::parse(
                r#"<span class="result-path">src/a.rs</span>
                   <span class="result-path">b.md</span>"#,
            ))
        });
        let listing = StaticListingFetcher::new(fetch);
        let texts = listing
            .wait_for_elements("u", "span.result-path", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(texts, ["src/a.rs", "b.md"]);
    }

    #[tokio::test]
    async fn no_matches_degrade_to_empty_not_error() {
        let mut fetch = MockFetch::new();
        fetch
            .expect_fetch()
            .returning(|_| Ok(Document::parse("<html></html>")));
        let listing = StaticListingFetcher::new(fetch);
        let texts = listing
            .wait_for_elements("u", "span.result-path", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(texts.is_empty());
    }
}
