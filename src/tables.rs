//! Classification tables: the static, read-only configuration every scrape
//! run shares.
//!
//! Loaded once at startup from the resource directory and passed explicitly
//! (behind an `Arc`) into the gateway and the classifier, never as ambient
//! global state. The YAML formats match the original resource files:
//! `languages.yml` maps a language name to its extension list, `vendor.yml`
//! and `documentation.yml` hold path patterns, `useragents.yml` holds the
//! user-agent pool.

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use regex::Regex;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::ScrapeError;

/// One first-party language and the path suffixes that mark it.
#[derive(Debug, Clone)]
pub struct Language {
    pub name: String,
    /// Lowercased suffixes, leading dot included (e.g. `.rs`).
    pub extensions: Vec<String>,
}

/// Immutable, process-wide classification configuration.
#[derive(Debug)]
pub struct ClassificationTables {
    /// Declaration order is match precedence.
    pub languages: Vec<Language>,
    pub vendor_patterns: Vec<Regex>,
    pub doc_patterns: Vec<Regex>,
    pub user_agents: Vec<String>,
}

#[derive(Deserialize)]
struct LanguageEntry {
    #[serde(default)]
    extensions: Vec<String>,
}

#[derive(Deserialize)]
struct DocumentationFile {
    #[serde(rename = "Files", default)]
    files: Vec<String>,
}

impl ClassificationTables {
    /// Load all four tables from `dir`. Any unreadable file or invalid
    /// pattern fails the whole load; a run never starts on partial tables.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let dir = dir.as_ref();
        info!(resources = %dir.display(), "loading classification tables");

        let languages = load_languages(&dir.join("languages.yml"))?;
        let vendor_patterns = compile_all(load_yaml::<Vec<String>>(&dir.join("vendor.yml"))?)?;
        let doc_file: DocumentationFile = load_yaml(&dir.join("documentation.yml"))?;
        let doc_patterns = compile_all(doc_file.files)?;
        let user_agents: Vec<String> = load_yaml(&dir.join("useragents.yml"))?;

        if user_agents.is_empty() {
            error!("useragents.yml contains no entries");
            return Err(ScrapeError::Tables("empty user-agent pool".into()));
        }

        info!(
            languages = languages.len(),
            vendor_patterns = vendor_patterns.len(),
            doc_patterns = doc_patterns.len(),
            user_agents = user_agents.len(),
            "classification tables loaded"
        );

        Ok(Self {
            languages,
            vendor_patterns,
            doc_patterns,
            user_agents,
        })
    }

    /// Build tables directly, compiling the given patterns. Used by tests
    /// and embedders that do not read from disk.
    pub fn from_parts(
        languages: Vec<(String, Vec<String>)>,
        vendor_patterns: Vec<String>,
        doc_patterns: Vec<String>,
        user_agents: Vec<String>,
    ) -> Result<Self, ScrapeError> {
        let languages = languages
            .into_iter()
            .map(|(name, extensions)| Language {
                name,
                extensions: extensions
                    .into_iter()
                    .map(|e| e.to_ascii_lowercase())
                    .collect(),
            })
            .collect();
        Ok(Self {
            languages,
            vendor_patterns: compile_all(vendor_patterns)?,
            doc_patterns: compile_all(doc_patterns)?,
            user_agents,
        })
    }

    /// A pseudo-random pick from the user-agent pool.
    pub fn random_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ScrapeError> {
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, path = %path.display(), "failed to read table file");
        ScrapeError::Tables(format!("read {}: {e}", path.display()))
    })?;
    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, path = %path.display(), "failed to parse table YAML");
        ScrapeError::Tables(format!("parse {}: {e}", path.display()))
    })
}

/// `languages.yml` is an ordered mapping; order is precedence, so it is
/// parsed through `serde_yaml::Mapping` rather than a sorted map.
fn load_languages(path: &Path) -> Result<Vec<Language>, ScrapeError> {
    let mapping: serde_yaml::Mapping = load_yaml(path)?;
    let mut languages = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let name = key
            .as_str()
            .ok_or_else(|| ScrapeError::Tables(format!("non-string language key in {}", path.display())))?
            .to_string();
        let entry: LanguageEntry = serde_yaml::from_value(value).map_err(|e| {
            ScrapeError::Tables(format!("language {name} in {}: {e}", path.display()))
        })?;
        languages.push(Language {
            name,
            extensions: entry
                .extensions
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        });
    }
    Ok(languages)
}

fn compile_all(patterns: Vec<String>) -> Result<Vec<Regex>, ScrapeError> {
    patterns
        .into_iter()
        .map(|p| Regex::new(&p).map_err(|e| ScrapeError::Tables(format!("pattern {p:?}: {e}"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassificationTables {
        ClassificationTables::from_parts(
            vec![
                ("Python".into(), vec![".py".into()]),
                ("JavaScript".into(), vec![".js".into()]),
                ("Rust".into(), vec![".rs".into()]),
            ],
            vec!["(^|/)vendor/".into(), r"\.min\.js$".into()],
            vec!["(^|/)README".into(), "(^|/)docs/".into()],
            vec!["agent-a".into(), "agent-b".into()],
        )
        .expect("sample tables compile")
    }

    #[test]
    fn language_order_is_preserved() {
        let tables = sample();
        let names: Vec<&str> = tables.languages.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Python", "JavaScript", "Rust"]);
    }

    #[test]
    fn user_agent_comes_from_pool() {
        let tables = sample();
        let ua = tables.random_user_agent().to_string();
        assert!(tables.user_agents.contains(&ua));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = ClassificationTables::from_parts(
            vec![],
            vec!["(unclosed".into()],
            vec![],
            vec!["ua".into()],
        );
        assert!(err.is_err());
    }
}
