//! The assembled result tree: Profile → Repositories → Files → blame.
//!
//! Ownership is a strict acyclic tree (nothing traverses upward, so there
//! are no back-references). Repositories and files live in maps keyed by
//! name/path, which is what makes the uniqueness invariants hold, but they
//! serialize as plain arrays.

use std::collections::BTreeMap;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::blame::BlameMap;
use crate::classify::FileType;

/// A scraped user profile. Constructed shallow (existence verified, nothing
/// else populated) and filled in by the assembler.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub username: String,
    pub name: String,
    pub avatar_url: String,
    pub follower_count: Option<u64>,
    /// Date (ISO `YYYY-MM-DD`) → contribution count. ISO keys sort
    /// lexicographically, so the map is ascending by date by construction.
    pub contribution_graph: BTreeMap<String, u64>,
    pub location: String,
    pub personal_site: String,
    pub workplace: String,
    /// Keyed by repository name; names are unique per profile.
    #[serde(serialize_with = "map_values")]
    pub repos: BTreeMap<String, Repository>,
}

impl Profile {
    /// The presence marker only: the username is proven to exist, no other
    /// field is populated yet.
    pub fn shallow(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: String::new(),
            avatar_url: String::new(),
            follower_count: None,
            contribution_graph: BTreeMap::new(),
            location: String::new(),
            personal_site: String::new(),
            workplace: String::new(),
            repos: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Repository {
    pub name: String,
    pub owner: String,
    pub topics: Vec<String>,
    pub star_count: Option<u64>,
    pub fork_count: Option<u64>,
    pub fork_status: Option<bool>,
    /// Keyed by path; paths are unique per repository.
    #[serde(serialize_with = "map_values")]
    pub files: BTreeMap<String, File>,
}

impl Repository {
    pub fn shallow(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            topics: Vec::new(),
            star_count: None,
            fork_count: None,
            fork_status: None,
            files: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct File {
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub raw_url: String,
    pub blames: BlameMap,
}

impl File {
    pub fn new(path: impl Into<String>, file_type: FileType, owner: &str, repo: &str) -> Self {
        let path = path.into();
        let raw_url = raw_content_url(owner, repo, &path);
        Self {
            path,
            file_type,
            raw_url,
            blames: BlameMap::new(),
        }
    }
}

/// Reference URL for a file's raw content over (owner, repo, branch
/// `master`, percent-encoded path). Referenced, never fetched.
pub fn raw_content_url(owner: &str, repo: &str, path: &str) -> String {
    let mut url =
        reqwest::Url::parse("https://raw.githubusercontent.com").expect("literal base URL");
    {
        let mut segments = url.path_segments_mut().expect("https URL has a path");
        segments.extend([owner, repo, "master"]);
        segments.extend(path.split('/'));
    }
    url.to_string()
}

fn map_values<S, T>(map: &BTreeMap<String, T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let mut seq = serializer.serialize_seq(Some(map.len()))?;
    for value in map.values() {
        seq.serialize_element(value)?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_url_percent_encodes_the_path() {
        let url = raw_content_url("octo", "demo", "src/hello world.rs");
        assert_eq!(
            url,
            "https://raw.githubusercontent.com/octo/demo/master/src/hello%20world.rs"
        );
    }

    #[test]
    fn repos_serialize_as_an_array() {
        let mut profile = Profile::shallow("octo");
        profile.repos.insert(
            "demo".into(),
            Repository::shallow("demo", "octo"),
        );
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json["repos"].is_array());
        assert_eq!(json["repos"][0]["name"], "demo");
    }

    #[test]
    fn file_type_serializes_as_its_label() {
        let file = File::new("README.rst", FileType::Documentation, "octo", "demo");
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "Documentation");
        let unclassified = File::new("x.bin", FileType::Unclassified, "octo", "demo");
        assert_eq!(serde_json::to_value(&unclassified).unwrap()["type"], "");
    }
}
