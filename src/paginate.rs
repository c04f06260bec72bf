//! Lazy, finite traversal of "next"-linked listing pages.
//!
//! A [`Paginator`] is a cursor: each [`next_page`](Paginator::next_page)
//! call fetches at most one page. Termination is guaranteed even against a
//! misbehaving host: a next link pointing at an already-visited URL stops
//! the traversal instead of looping.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::contract::Fetch;
use crate::document::Document;
use crate::error::ScrapeError;

/// Visible label of the pagination control that advances the listing.
pub const NEXT_LABEL: &str = "Next";

/// Extracts the next-page URL the way the repository listing renders it:
/// no pagination container means a single page; otherwise follow the anchor
/// in the button group whose visible label is exactly [`NEXT_LABEL`].
pub fn labeled_next_link(document: &Document) -> Option<String> {
    document.find("div", "paginate-container")?;
    document
        .find_all("a", "btn btn-outline BtnGroup-item")
        .into_iter()
        .find(|a| a.text() == NEXT_LABEL)
        .and_then(|a| a.attr("href").map(str::to_string))
}

/// Page cursor over a fetcher and a next-link extraction function.
pub struct Paginator<'a, F, N>
where
    F: Fetch + ?Sized,
    N: FnMut(&Document) -> Option<String>,
{
    fetcher: &'a F,
    next_link: N,
    pending: Option<String>,
    visited: HashSet<String>,
}

impl<'a, F, N> Paginator<'a, F, N>
where
    F: Fetch + ?Sized,
    N: FnMut(&Document) -> Option<String>,
{
    pub fn new(fetcher: &'a F, seed_url: impl Into<String>, next_link: N) -> Self {
        Self {
            fetcher,
            next_link,
            pending: Some(seed_url.into()),
            visited: HashSet::new(),
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    ///
    /// Strict progress: every advance must reach a URL not seen before in
    /// this traversal. A repeated URL ends the traversal with a warning.
    pub async fn next_page(&mut self) -> Result<Option<Document>, ScrapeError> {
        let url = match self.pending.take() {
            Some(url) => url,
            None => return Ok(None),
        };
        if !self.visited.insert(url.clone()) {
            warn!(url, "pagination cursor revisited a URL; stopping");
            return Ok(None);
        }

        debug!(url, page = self.visited.len(), "fetching listing page");
        let document = self.fetcher.fetch(&url).await?;
        self.pending = (self.next_link)(&document);
        Ok(Some(document))
    }

    /// Drain every remaining page, applying `extract` to each.
    pub async fn collect_items<T>(
        mut self,
        mut extract: impl FnMut(&Document) -> Vec<T>,
    ) -> Result<Vec<T>, ScrapeError> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(extract(&page));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockFetch;

    fn listing_page(items: &[&str], next: Option<&str>) -> String {
        let lis: String = items
            .iter()
            .map(|i| format!(r#"<li class="item">{i}</li>"#))
            .collect();
        match next {
            Some(href) => format!(
                r#"{lis}<div class="paginate-container">
                   <a class="btn btn-outline BtnGroup-item" href="{href}">Next</a></div>"#
            ),
            None => format!(r#"{lis}<div class="paginate-container"></div>"#),
        }
    }

    fn expect_page(mock: &mut MockFetch, url: &'static str, body: String) {
        mock.expect_fetch()
            .withf(move |u| u == url)
            .returning(move |_| Ok(Document::parse(body.clone())));
    }

    #[tokio::test]
    async fn two_pages_concatenate_then_stop() {
        let mut fetch = MockFetch::new();
        expect_page(&mut fetch, "p1", listing_page(&["a", "b"], Some("p2")));
        expect_page(&mut fetch, "p2", listing_page(&["c"], None));

        let paginator = Paginator::new(&fetch, "p1", labeled_next_link);
        let items = paginator
            .collect_items(|doc| doc.texts("li", "item"))
            .await
            .unwrap();
        assert_eq!(items, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn page_without_pagination_control_is_single() {
        let mut fetch = MockFetch::new();
        expect_page(&mut fetch, "only", r#"<li class="item">x</li>"#.to_string());

        let paginator = Paginator::new(&fetch, "only", labeled_next_link);
        let items = paginator
            .collect_items(|doc| doc.texts("li", "item"))
            .await
            .unwrap();
        assert_eq!(items, ["x"]);
    }

    #[tokio::test]
    async fn repeating_next_link_trips_the_cycle_guard() {
        let mut fetch = MockFetch::new();
        // Both pages point back at p1.
        expect_page(&mut fetch, "p1", listing_page(&["a"], Some("p2")));
        expect_page(&mut fetch, "p2", listing_page(&["b"], Some("p1")));

        let paginator = Paginator::new(&fetch, "p1", labeled_next_link);
        let items = paginator
            .collect_items(|doc| doc.texts("li", "item"))
            .await
            .unwrap();
        // p1 is not fetched a second time.
        assert_eq!(items, ["a", "b"]);
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let mut fetch = MockFetch::new();
        fetch.expect_fetch().returning(|url| {
            Err(ScrapeError::DeniedRequest {
                url: url.to_string(),
            })
        });

        let mut paginator = Paginator::new(&fetch, "p1", labeled_next_link);
        assert!(matches!(
            paginator.next_page().await,
            Err(ScrapeError::DeniedRequest { .. })
        ));
    }
}
