//! Language extractor: bytes and file counts per language.

use std::collections::BTreeMap;

use crate::languages::REGISTRY;
use crate::tree::{FileNode, ProjectTree};

/// Byte and file totals per language.
///
/// Only programming and markup languages (plus `unknown` for unresolved
/// ambiguous extensions) are counted; data and prose formats are not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageSignal {
    pub bytes: BTreeMap<String, u64>,
    pub files: BTreeMap<String, usize>,
}

impl LanguageSignal {
    pub fn total_bytes(&self) -> u64 {
        self.bytes.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn add(&mut self, language: &str, bytes: u64) {
        *self.bytes.entry(language.to_string()).or_insert(0) += bytes;
        *self.files.entry(language.to_string()).or_insert(0) += 1;
    }
}

pub fn extract(tree: &ProjectTree) -> LanguageSignal {
    let mut signal = LanguageSignal::default();

    for file in &tree.files {
        if let Some(language) = source_language(file, tree.content(&file.relative_path)) {
            signal.add(language, file.size_bytes);
        }
    }

    signal
}

/// Language of a single file if it counts toward the signal.
pub fn source_language(file: &FileNode, content: Option<&str>) -> Option<&'static str> {
    let language = REGISTRY.detect(file, content)?;
    REGISTRY
        .kind_of(language)
        .is_some_and(|kind| kind.is_source())
        .then_some(language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(path: &str, size: u64) -> FileNode {
        FileNode {
            relative_path: path.to_string(),
            size_bytes: size,
            extension: path.rsplit_once('.').map(|(_, e)| e.to_lowercase()),
            modified_at: None,
            oversized: false,
        }
    }

    #[test]
    fn test_bytes_per_language() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        tree.files = vec![
            file("src/app.tsx", 300),
            file("src/util.ts", 200),
            file("server.py", 100),
            file("package.json", 900),
            file("README.md", 5000),
            file("logo.png", 10_000),
        ];

        let signal = extract(&tree);
        assert_eq!(signal.bytes["typescript"], 500);
        assert_eq!(signal.files["typescript"], 2);
        assert_eq!(signal.bytes["python"], 100);
        assert!(!signal.bytes.contains_key("json"));
        assert!(!signal.bytes.contains_key("markdown"));
        assert_eq!(signal.total_bytes(), 600);
    }

    #[test]
    fn test_ambiguous_header_without_content_is_unknown() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        tree.files = vec![file("include/api.h", 40)];
        let signal = extract(&tree);
        assert_eq!(signal.bytes["unknown"], 40);
    }

    #[test]
    fn test_ambiguous_header_with_content() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        tree.files = vec![file("include/api.h", 60)];
        tree.insert_content(
            "include/api.h".to_string(),
            "namespace api {\nclass Client {};\n}\n".to_string(),
        );
        let signal = extract(&tree);
        assert_eq!(signal.bytes["cpp"], 60);
    }
}
