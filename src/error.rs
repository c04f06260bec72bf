//! Named error kinds for the scrape pipeline.
//!
//! Identity-critical failures get their own variants and propagate;
//! best-effort attribute failures never reach this type (the assembler
//! defaults those fields silently).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The host answered with its anti-scraping block page. Not retried
    /// internally; the triggering scrape step aborts.
    #[error("host denied the request for {url}")]
    DeniedRequest { url: String },

    /// The profile page for `username` lacks the existence marker. Raised
    /// before any other profile field is read.
    #[error("no profile exists for username {username:?}")]
    InvalidUsername { username: String },

    /// Transport-level failure for one URL.
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Classification tables could not be loaded or compiled.
    #[error("classification tables: {0}")]
    Tables(String),

    /// A worker task in a concurrent batch aborted (panicked or was
    /// cancelled); the whole batch fails.
    #[error("concurrent batch task aborted: {0}")]
    TaskFailed(String),
}
