//! In-memory snapshot of the analyzed directory.
//!
//! The tree is built once by the [`TreeWalker`] and then only read. Paths are
//! relative to the analysis root and always use `/` as separator.

pub mod walker;

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::AnalysisNote;

pub use walker::TreeWalker;

/// A regular file found during the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub relative_path: String,
    pub size_bytes: u64,
    /// Lowercased extension without the dot
    pub extension: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Larger than the per-file read limit; contents were never read
    pub oversized: bool,
}

impl FileNode {
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Parent directory, `""` for files at the root.
    pub fn parent_dir(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(idx) => &self.relative_path[..idx],
            None => "",
        }
    }

    /// Number of directories between the root and this file.
    pub fn depth(&self) -> usize {
        path_depth(&self.relative_path)
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn is_at_root(&self) -> bool {
        !self.relative_path.contains('/')
    }

    /// Iterates over the directory components of the path.
    pub fn dir_components(&self) -> impl Iterator<Item = &str> {
        self.parent_dir().split('/').filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirNode {
    pub relative_path: String,
}

impl DirNode {
    pub fn name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}

/// Result of one walk: the file/dir index plus selected file contents.
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    pub root: PathBuf,
    pub files: Vec<FileNode>,
    pub dirs: Vec<DirNode>,
    pub total_size: u64,
    pub truncated: bool,
    pub truncation_reason: Option<String>,
    pub is_git_repo: bool,
    pub notes: Vec<AnalysisNote>,
    contents: HashMap<String, String>,
}

impl ProjectTree {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file(&self, relative_path: &str) -> Option<&FileNode> {
        self.files.iter().find(|f| f.relative_path == relative_path)
    }

    pub fn has_file(&self, relative_path: &str) -> bool {
        self.file(relative_path).is_some()
    }

    pub fn has_dir(&self, relative_path: &str) -> bool {
        self.dirs.iter().any(|d| d.relative_path == relative_path)
    }

    /// Files whose name matches exactly, in walk order.
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileNode> + 'a {
        self.files.iter().filter(move |f| f.file_name() == name)
    }

    /// Closest-to-root file with the given name.
    pub fn closest_named(&self, name: &str) -> Option<&FileNode> {
        self.files
            .iter()
            .filter(|f| f.file_name() == name)
            .min_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.relative_path.cmp(&b.relative_path)))
    }

    /// Direct children files of a directory (`""` for the root).
    pub fn files_in<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a FileNode> + 'a {
        self.files.iter().filter(move |f| f.parent_dir() == dir)
    }

    /// Any file below the given directory, at any depth.
    pub fn has_files_under(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.files.iter().any(|f| f.relative_path.starts_with(&prefix))
    }

    pub fn content(&self, relative_path: &str) -> Option<&str> {
        self.contents.get(relative_path).map(String::as_str)
    }

    pub fn content_count(&self) -> usize {
        self.contents.len()
    }

    pub(crate) fn insert_content(&mut self, relative_path: String, content: String) {
        self.contents.insert(relative_path, content);
    }

    /// Files with readable content, in walk order.
    pub fn readable_files(&self) -> impl Iterator<Item = (&FileNode, &str)> {
        self.files
            .iter()
            .filter_map(move |f| self.content(&f.relative_path).map(|c| (f, c)))
    }
}

/// Number of `/`-separated directory levels above a relative file path.
pub fn path_depth(relative_path: &str) -> usize {
    relative_path.matches('/').count()
}

/// Directory of a relative path, `""` for entries at the root.
pub fn parent_of(relative_path: &str) -> &str {
    match relative_path.rfind('/') {
        Some(idx) => &relative_path[..idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &str) -> FileNode {
        FileNode {
            relative_path: path.to_string(),
            size_bytes: 1,
            extension: None,
            modified_at: None,
            oversized: false,
        }
    }

    #[test]
    fn test_file_node_parts() {
        let file = node("src/app/main.py");
        assert_eq!(file.file_name(), "main.py");
        assert_eq!(file.parent_dir(), "src/app");
        assert_eq!(file.depth(), 2);
        assert_eq!(file.dir_components().collect::<Vec<_>>(), vec!["src", "app"]);

        let root_file = node("README.md");
        assert!(root_file.is_at_root());
        assert_eq!(root_file.parent_dir(), "");
        assert_eq!(root_file.dir_components().count(), 0);
    }

    #[test]
    fn test_closest_named_prefers_shallow() {
        let mut tree = ProjectTree::new(PathBuf::from("/tmp"));
        tree.files = vec![node("a/b/package.json"), node("package.json"), node("z/package.json")];

        assert_eq!(
            tree.closest_named("package.json").map(|f| f.relative_path.as_str()),
            Some("package.json")
        );
        assert_eq!(tree.files_named("package.json").count(), 3);
        assert!(tree.has_files_under("a"));
        assert!(!tree.has_files_under("b"));
    }

    #[test]
    fn test_closest_named_outlives_query() {
        let mut tree = ProjectTree::new(PathBuf::from("/tmp"));
        tree.files = vec![node("deep/go.mod"), node("go.mod")];

        let found = {
            let query = String::from("go.mod");
            tree.closest_named(&query)
        };
        assert_eq!(found.map(|f| f.relative_path.as_str()), Some("go.mod"));
        assert!(tree.closest_named("Cargo.toml").is_none());
    }

    #[test]
    fn test_contents() {
        let mut tree = ProjectTree::new(PathBuf::from("/tmp"));
        tree.files = vec![node("main.py"), node("logo.png")];
        tree.insert_content("main.py".to_string(), "print(1)".to_string());

        assert_eq!(tree.content("main.py"), Some("print(1)"));
        assert_eq!(tree.readable_files().count(), 1);
        assert_eq!(tree.content_count(), 1);
    }
}
