//! Path classification: language, documentation, or nothing.

use serde::Serialize;

use crate::tables::ClassificationTables;

/// Category assigned to a discovered path. Serializes to the language name,
/// `"Documentation"`, or the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    Language(String),
    Documentation,
    Unclassified,
}

impl FileType {
    pub fn as_str(&self) -> &str {
        match self {
            FileType::Language(name) => name,
            FileType::Documentation => "Documentation",
            FileType::Unclassified => "",
        }
    }

    /// Anything classified counts as scrape-worthy; unclassified paths are
    /// skipped during file discovery.
    pub fn is_classified(&self) -> bool {
        !matches!(self, FileType::Unclassified)
    }
}

impl Serialize for FileType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classify `path` against the tables. Deterministic, no side effects.
///
/// Precedence, first match wins:
/// 1. a language whose extension set matches the lowercased suffix, unless
///    any vendor pattern matches the path (vendored code is never credited
///    as a first-party language);
/// 2. a documentation pattern (vendor paths still reach this check);
/// 3. unclassified.
pub fn classify(path: &str, tables: &ClassificationTables) -> FileType {
    let lowered = path.to_ascii_lowercase();

    let language = tables
        .languages
        .iter()
        .find(|lang| lang.extensions.iter().any(|ext| lowered.ends_with(ext.as_str())));
    if let Some(lang) = language {
        let vendored = tables.vendor_patterns.iter().any(|re| re.is_match(path));
        if !vendored {
            return FileType::Language(lang.name.clone());
        }
    }

    if tables.doc_patterns.iter().any(|re| re.is_match(path)) {
        return FileType::Documentation;
    }

    FileType::Unclassified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::ClassificationTables;

    fn tables() -> ClassificationTables {
        ClassificationTables::from_parts(
            vec![
                ("Python".into(), vec![".py".into()]),
                ("JavaScript".into(), vec![".js".into()]),
            ],
            vec!["(^|/)vendor/".into(), r"\.min\.js$".into()],
            vec!["(^|/)README".into()],
            vec!["ua".into()],
        )
        .unwrap()
    }

    #[test]
    fn language_by_lowercased_suffix() {
        let t = tables();
        assert_eq!(classify("src/App.PY", &t), FileType::Language("Python".into()));
    }

    #[test]
    fn vendor_suppresses_language_then_falls_through_to_doc_check() {
        let t = tables();
        // Vendored code: language match suppressed, no doc pattern → empty.
        assert_eq!(classify("vendor/jquery.min.js", &t), FileType::Unclassified);
        // Vendored path that *is* documentation still classifies as such.
        assert_eq!(classify("vendor/README.md", &t), FileType::Documentation);
    }

    #[test]
    fn readme_is_documentation_whatever_its_extension() {
        let t = tables();
        assert_eq!(classify("README.md", &t), FileType::Documentation);
        assert_eq!(classify("docs/README.rst", &t), FileType::Documentation);
    }

    #[test]
    fn unknown_suffix_without_doc_pattern_is_unclassified() {
        let t = tables();
        assert_eq!(classify("assets/logo.svg", &t), FileType::Unclassified);
    }
}
