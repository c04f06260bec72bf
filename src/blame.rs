//! Per-line authorship: hunk extraction and per-author aggregation.
//!
//! A blame page renders one block per commit hunk; each block carries the
//! hunk's line numbers and an author label. Duet commits (pair programming)
//! label the block `"<author> and <committer> (non-author committer)"`.
//! Aggregation merges all hunks for one file into a per-author
//! line-ownership map.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::document::Document;

/// Separator between the two identities of a duet label.
pub const DUET_SEPARATOR: &str = " and ";
/// Qualifier trailing the second identity of a duet label.
pub const COMMITTER_QUALIFIER: &str = " (non-author committer)";

const HUNK_CLASS: &str = "blame-hunk d-flex border-gray-light border-bottom";
const LINE_NUMBER_CLASS: &str = "blob-num blame-blob-num bg-gray-light js-line-number";
const AUTHOR_STACK_CLASS: &str = "AvatarStack-body";

/// One commit hunk as the page reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameHunk {
    pub line_numbers: Vec<u32>,
    pub author_label: String,
}

/// Accumulated ownership for one author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlameRecord {
    /// Grows only by set union; re-reporting a line is idempotent.
    pub line_numbers: BTreeSet<u32>,
    /// Non-author committers seen alongside this author.
    pub committers: BTreeSet<String>,
}

/// Author identity → accumulated ownership.
pub type BlameMap = BTreeMap<String, BlameRecord>;

/// Read every commit-hunk block out of a rendered blame page.
pub fn parse_hunks(document: &Document) -> Vec<BlameHunk> {
    let mut hunks = Vec::new();
    for section in document.find_all("div", HUNK_CLASS) {
        let inner = section.inner();
        let line_numbers: Vec<u32> = inner
            .texts("div", LINE_NUMBER_CLASS)
            .iter()
            .filter_map(|t| t.parse().ok())
            .collect();
        let author_label = match inner
            .find("div", AUTHOR_STACK_CLASS)
            .and_then(|el| el.attr("aria-label").map(str::to_string))
        {
            Some(label) => label,
            None => continue,
        };
        hunks.push(BlameHunk {
            line_numbers,
            author_label,
        });
    }
    debug!(hunks = hunks.len(), "parsed blame hunks");
    hunks
}

/// Merge hunks into a per-author map.
///
/// The merge is associative and commutative in hunk order: line numbers
/// union and committer sets accumulate, so any processing order yields the
/// same map.
pub fn aggregate(hunks: impl IntoIterator<Item = BlameHunk>) -> BlameMap {
    let mut map = BlameMap::new();
    for hunk in hunks {
        let (author, committer) = split_author_label(&hunk.author_label);
        let record = map.entry(author.to_string()).or_default();
        record.line_numbers.extend(hunk.line_numbers.iter().copied());
        if let Some(committer) = committer {
            record.committers.insert(committer.to_string());
        }
    }
    map
}

/// Split a label into author and, for duet commits, the non-author
/// committer with its qualifier stripped.
fn split_author_label(label: &str) -> (&str, Option<&str>) {
    match label.split_once(DUET_SEPARATOR) {
        Some((author, rest)) => {
            let committer = rest
                .split_once(COMMITTER_QUALIFIER)
                .map(|(c, _)| c)
                .unwrap_or(rest);
            (author, Some(committer))
        }
        None => (label, None),
    }
}
