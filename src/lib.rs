#![doc = "git-pull: scrape a structured user profile from a code-hosting site's rendered pages."]

//! The pipeline: check the username exists, walk the paginated repository
//! listing, discover each repository's files through the rendering
//! environment, classify every path, and aggregate per-commit blame blocks
//! into a per-author line-ownership map, with bounded concurrency over the
//! per-file fetches.
//!
//! External collaborators (the fetch-and-parse round trip and the dynamic
//! rendering environment) are consumed through the traits in [`contract`];
//! production implementations live in [`gateway`] and [`dynamic`].

pub mod assemble;
pub mod blame;
pub mod classify;
pub mod cli;
pub mod contract;
pub mod document;
pub mod dynamic;
pub mod error;
pub mod gateway;
pub mod model;
pub mod paginate;
pub mod pool;
pub mod tables;

pub use assemble::{ProfileAssembler, ScrapeOptions};
pub use error::ScrapeError;
