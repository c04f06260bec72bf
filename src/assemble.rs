//! Top-level orchestration: username → Profile → Repositories → Files →
//! blame.
//!
//! The assembler is not a pure function; it sequences the other components
//! and decides which failures abort and which default. Identity-critical
//! checks (profile existence, fetch denial) propagate as named errors;
//! the enumerated best-effort attributes (name, avatar, follower count,
//! location, personal site, workplace, topics, star/fork data) default
//! silently when their page region is missing or malformed.
//!
//! Entities move Shallow → Populated exactly once, either through the
//! `full` option at scrape time or by the piecemeal operations
//! ([`scrape_repository`](ProfileAssembler::scrape_repository),
//! [`scrape_file`](ProfileAssembler::scrape_file)); populated fields are
//! never re-validated.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::blame;
use crate::classify::{classify, FileType};
use crate::contract::{DynamicFetch, Fetch};
use crate::document::Document;
use crate::error::ScrapeError;
use crate::model::{File, Profile, Repository};
use crate::paginate::{labeled_next_link, Paginator};
use crate::pool::map_concurrent;
use crate::tables::ClassificationTables;

/// Region whose presence proves the username exists.
const EXISTENCE_MARKER: (&str, &str) = ("div", "js-yearly-contributions");
/// Locator handed to the rendering environment for the file-tree listing.
const FILE_LISTING_LOCATOR: &str = "span.d-inline-block js-tree-browser-result-path";

const NAME_CLASS: &str = "p-name vcard-fullname d-block overflow-hidden";
const AVATAR_CLASS: &str = "avatar avatar-user width-full border bg-white";
const FOLLOWER_LINK_CLASS: &str = "link-gray no-underline no-wrap";
const FOLLOWER_COUNT_CLASS: &str = "text-bold text-gray-dark";
const YEAR_LINK_CLASS: &str = "js-year-link filter-item px-3 mb-2 py-2";
const TOPIC_CLASS: &str = "topic-tag topic-tag-link";
const STAR_COUNT_CLASS: &str = "social-count js-social-count";
const SOCIAL_COUNT_CLASS: &str = "social-count";
const FORK_ICON_CLASS: &str = "octicon octicon-repo-forked text-gray mr-2";
const REPO_CARD_CLASS: &str = "d-inline-block mb-1";

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Populate everything (attributes, repos, files, blame) in one pass.
    pub full: bool,
    /// Worker bound for concurrent per-file scrapes; `None` uses the
    /// host's logical core count, `Some(0)` forces sequential execution.
    pub concurrency: Option<usize>,
    /// How long the rendering environment may wait for the file listing.
    pub listing_timeout: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            full: false,
            concurrency: None,
            listing_timeout: Duration::from_secs(10),
        }
    }
}

pub struct ProfileAssembler {
    fetcher: Arc<dyn Fetch>,
    listing: Arc<dyn DynamicFetch>,
    tables: Arc<ClassificationTables>,
    options: ScrapeOptions,
    base_url: String,
}

impl ProfileAssembler {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        listing: Arc<dyn DynamicFetch>,
        tables: Arc<ClassificationTables>,
        options: ScrapeOptions,
    ) -> Self {
        Self {
            fetcher,
            listing,
            tables,
            options,
            base_url: "https://github.com".to_string(),
        }
    }

    /// Point the assembler at a different host (used by offline tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Scrape a user. The existence check runs before anything else: a page
    /// without the contribution-activity region fails with
    /// [`ScrapeError::InvalidUsername`] and no partial Profile escapes.
    pub async fn scrape_profile(&self, username: &str) -> Result<Profile, ScrapeError> {
        let url = format!("{}/{}", self.base_url, username);
        info!(username, "scraping profile");
        let page = self.fetcher.fetch(&url).await?;

        let (tag, class) = EXISTENCE_MARKER;
        if page.find(tag, class).is_none() {
            return Err(ScrapeError::InvalidUsername {
                username: username.to_string(),
            });
        }

        let mut profile = Profile::shallow(username);
        if !self.options.full {
            return Ok(profile);
        }

        profile.name = personal_info(&page, "span", NAME_CLASS).unwrap_or_default();
        profile.avatar_url = scrape_avatar(&page).unwrap_or_default();
        profile.follower_count = scrape_follower_count(&page);
        profile.location = personal_info(&page, "span", "p-label").unwrap_or_default();
        profile.personal_site = scrape_personal_site(&page).unwrap_or_default();
        profile.workplace = personal_info(&page, "span", "p-org").unwrap_or_default();
        profile.contribution_graph = self.scrape_contribution_graph(&page).await?;
        profile.repos = self.scrape_repos(username).await?;

        info!(
            username,
            repos = profile.repos.len(),
            contributions = profile.contribution_graph.len(),
            "profile populated"
        );
        Ok(profile)
    }

    /// Contribution tiles from the base page merged with every per-year
    /// sub-page, de-duplicated by date key. Ascending by date because the
    /// keys are ISO dates in an ordered map.
    async fn scrape_contribution_graph(
        &self,
        page: &Document,
    ) -> Result<BTreeMap<String, u64>, ScrapeError> {
        let mut graph = contribution_tiles(page);
        for link in page.find_all("a", YEAR_LINK_CLASS) {
            let href = match link.attr("href") {
                Some(href) => href.to_string(),
                None => continue,
            };
            let url = format!("{}{}", self.base_url, href);
            let year_page = self.fetcher.fetch(&url).await?;
            graph.extend(contribution_tiles(&year_page));
        }
        Ok(graph)
    }

    /// Enumerate the user's repositories through the paginated listing and
    /// scrape each one.
    pub async fn scrape_repos(
        &self,
        username: &str,
    ) -> Result<BTreeMap<String, Repository>, ScrapeError> {
        let seed = format!("{}/{}?page=1&tab=repositories", self.base_url, username);
        let paginator = Paginator::new(self.fetcher.as_ref(), seed, labeled_next_link);
        let names = paginator.collect_items(repo_names_on_page).await?;
        info!(username, repos = names.len(), "repository listing complete");

        let mut repos = BTreeMap::new();
        for name in names {
            let repo = self.scrape_repository(username, &name).await?;
            repos.insert(name, repo);
        }
        Ok(repos)
    }

    /// Scrape one repository. Attribute regions are best-effort; file
    /// discovery and (under `full`) the blame batch are not.
    pub async fn scrape_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Repository, ScrapeError> {
        let url = format!("{}/{}/{}", self.base_url, owner, name);
        let page = self.fetcher.fetch(&url).await?;

        let mut repo = Repository::shallow(name, owner);
        repo.topics = scrape_topics(&page);
        repo.star_count = scrape_star_count(&page);
        repo.fork_count = scrape_fork_count(&page);
        repo.fork_status = Some(page.find("svg", FORK_ICON_CLASS).is_some());

        if self.options.full {
            repo.files = self.scrape_files(owner, name).await?;
        }
        Ok(repo)
    }

    /// Discover the repository's file paths through the rendering
    /// environment and classify them. An empty listing (timeout or truly
    /// empty tree) yields no files, not an error. Unclassified paths drop.
    pub async fn discover_files(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<(String, FileType)>, ScrapeError> {
        let url = format!("{}/{}/{}/find/master", self.base_url, owner, repo);
        let paths = self
            .listing
            .wait_for_elements(&url, FILE_LISTING_LOCATOR, self.options.listing_timeout)
            .await?;

        let mut discovered = Vec::new();
        for path in paths {
            let file_type = classify(&path, &self.tables);
            if file_type.is_classified() {
                discovered.push((path, file_type));
            } else {
                debug!(path, "dropping unclassified path");
            }
        }
        info!(owner, repo, files = discovered.len(), "file discovery complete");
        Ok(discovered)
    }

    /// Discover and scrape all files of a repository, fetching blame for
    /// each over the worker pool. One failing blame fetch aborts the whole
    /// batch for this repository; no partial file set is returned.
    pub async fn scrape_files(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<BTreeMap<String, File>, ScrapeError> {
        let discovered = self.discover_files(owner, repo).await?;

        let files = map_concurrent(discovered, self.options.concurrency, |(path, file_type)| {
            let fetcher = Arc::clone(&self.fetcher);
            let base_url = self.base_url.clone();
            let owner = owner.to_string();
            let repo = repo.to_string();
            async move {
                scrape_file_blames(&*fetcher, &base_url, &owner, &repo, path, file_type).await
            }
        })
        .await?;

        Ok(files
            .into_iter()
            .map(|file| (file.path.clone(), file))
            .collect())
    }

    /// Piecemeal single-file scrape; the escape hatch for callers that
    /// want per-file failure tolerance instead of the batch contract.
    pub async fn scrape_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        with_blame: bool,
    ) -> Result<File, ScrapeError> {
        let file_type = classify(path, &self.tables);
        if !with_blame {
            return Ok(File::new(path, file_type, owner, repo));
        }
        scrape_file_blames(
            self.fetcher.as_ref(),
            &self.base_url,
            owner,
            repo,
            path.to_string(),
            file_type,
        )
        .await
    }
}

async fn scrape_file_blames(
    fetcher: &dyn Fetch,
    base_url: &str,
    owner: &str,
    repo: &str,
    path: String,
    file_type: FileType,
) -> Result<File, ScrapeError> {
    let url = format!("{base_url}/{owner}/{repo}/blame/master/{path}");
    let page = fetcher.fetch(&url).await?;
    let mut file = File::new(path, file_type, owner, repo);
    file.blames = blame::aggregate(blame::parse_hunks(&page));
    Ok(file)
}

// Best-effort attribute extraction. Each returns None when its page region
// is missing or malformed; the assembler applies the empty default. None of
// these may be used for identity-critical decisions.

fn personal_info(page: &Document, tag: &str, class: &str) -> Option<String> {
    let text = page.find(tag, class)?.text();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn scrape_avatar(page: &Document) -> Option<String> {
    page.find("img", AVATAR_CLASS)?.attr("src").map(str::to_string)
}

fn scrape_follower_count(page: &Document) -> Option<u64> {
    let link = page.find("a", FOLLOWER_LINK_CLASS)?;
    parse_count(&link.inner().find("span", FOLLOWER_COUNT_CLASS)?.text())
}

fn scrape_personal_site(page: &Document) -> Option<String> {
    page.find_with_attr("li", "data-test-selector", "profile-website-url")?
        .inner()
        .find("a", "")?
        .attr("href")
        .map(str::to_string)
}

fn contribution_tiles(page: &Document) -> BTreeMap<String, u64> {
    page.find_all("rect", "day")
        .into_iter()
        .filter_map(|tile| {
            let date = tile.attr("data-date")?.to_string();
            let count = tile.attr("data-count")?.parse().ok()?;
            Some((date, count))
        })
        .collect()
}

fn repo_names_on_page(page: &Document) -> Vec<String> {
    page.find_all("div", REPO_CARD_CLASS)
        .into_iter()
        .filter_map(|card| card.inner().find("a", ""))
        .map(|a| a.text().replace(' ', ""))
        .filter(|name| !name.is_empty())
        .collect()
}

fn scrape_topics(page: &Document) -> Vec<String> {
    page.texts("a", TOPIC_CLASS)
        .into_iter()
        .map(|t| t.replace(' ', ""))
        .collect()
}

fn scrape_star_count(page: &Document) -> Option<u64> {
    let label = page.find("a", STAR_COUNT_CLASS)?.attr("aria-label")?.to_string();
    parse_count(label.split_whitespace().next()?)
}

/// The fork counter is the third social-count control on the page.
fn scrape_fork_count(page: &Document) -> Option<u64> {
    let counts = page.find_all("a", SOCIAL_COUNT_CLASS);
    parse_count(&counts.get(2)?.text())
}

fn parse_count(text: &str) -> Option<u64> {
    text.trim().replace(',', "").parse().ok()
}
