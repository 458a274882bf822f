//! Directory layout summary: the top of the walked tree plus the directory
//! names seen in it.
//!
//! Built from the walker's index; nothing is read from disk here. Hidden
//! entries are left out, and so is everything below them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::tree::ProjectTree;

/// Levels of entries kept below the root (root children are level 0).
pub const MAX_STRUCTURE_LEVEL: usize = 3;

/// Children listed per directory; the rest are only counted.
pub const MAX_ENTRIES_PER_DIR: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// File size in bytes; `0` for directories
    pub size: u64,
    /// Present for directories above the level limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<StructureNode>>,
    /// Children beyond the per-directory limit
    #[serde(default, skip_serializing_if = "is_zero")]
    pub omitted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStructure {
    pub tree: Vec<StructureNode>,
    /// Sorted, distinct names of directories within the kept levels
    pub common_directories: Vec<String>,
}

impl DirectoryStructure {
    pub fn has_directory(&self, name: &str) -> bool {
        self.common_directories.iter().any(|d| d == name)
    }
}

#[derive(Default)]
struct Level {
    is_dir: bool,
    size: u64,
    children: BTreeMap<String, Level>,
}

impl Level {
    fn insert(&mut self, path: &str, is_dir: bool, size: u64) {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() > MAX_STRUCTURE_LEVEL + 1 || segments.iter().any(|s| s.starts_with('.')) {
            return;
        }

        let mut node = self;
        let last = segments.len() - 1;
        for (i, segment) in segments.into_iter().enumerate() {
            node = node.children.entry(segment.to_string()).or_default();
            if i < last {
                node.is_dir = true;
            }
        }
        node.is_dir |= is_dir;
        node.size = if is_dir { 0 } else { size };
    }

    fn into_nodes(self, level: usize, dirs: &mut BTreeSet<String>) -> (Vec<StructureNode>, usize) {
        let total = self.children.len();
        let mut nodes = Vec::with_capacity(total.min(MAX_ENTRIES_PER_DIR));

        for (name, child) in self.children.into_iter().take(MAX_ENTRIES_PER_DIR) {
            let node = if child.is_dir {
                dirs.insert(name.clone());
                let (children, omitted) = if level < MAX_STRUCTURE_LEVEL {
                    let (kids, omitted) = child.into_nodes(level + 1, dirs);
                    (Some(kids), omitted)
                } else {
                    (None, 0)
                };
                StructureNode {
                    name,
                    node_type: NodeType::Directory,
                    size: 0,
                    children,
                    omitted,
                }
            } else {
                StructureNode {
                    name,
                    node_type: NodeType::File,
                    size: child.size,
                    children: None,
                    omitted: 0,
                }
            };
            nodes.push(node);
        }

        (nodes, total.saturating_sub(MAX_ENTRIES_PER_DIR))
    }
}

/// Summarizes the first levels of the walked tree, entries sorted by name.
pub fn summarize(tree: &ProjectTree) -> DirectoryStructure {
    let mut root = Level {
        is_dir: true,
        ..Default::default()
    };
    for dir in &tree.dirs {
        root.insert(&dir.relative_path, true, 0);
    }
    for file in &tree.files {
        root.insert(&file.relative_path, false, file.size_bytes);
    }

    let mut dirs = BTreeSet::new();
    let (nodes, _) = root.into_nodes(0, &mut dirs);
    DirectoryStructure {
        tree: nodes,
        common_directories: dirs.into_iter().collect(),
    }
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{DirNode, FileNode};
    use std::path::PathBuf;

    fn tree_of(dirs: &[&str], files: &[(&str, u64)]) -> ProjectTree {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        tree.dirs = dirs
            .iter()
            .map(|d| DirNode {
                relative_path: d.to_string(),
            })
            .collect();
        tree.files = files
            .iter()
            .map(|(path, size)| FileNode {
                relative_path: path.to_string(),
                size_bytes: *size,
                extension: path.rsplit_once('.').map(|(_, e)| e.to_string()),
                modified_at: None,
                oversized: false,
            })
            .collect();
        tree
    }

    fn names(nodes: &[StructureNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_nested_layout_sorted_by_name() {
        let tree = tree_of(
            &["src", "src/api", "docs", "public"],
            &[("package.json", 120), ("src/index.ts", 40), ("src/api/routes.ts", 10), ("README.md", 7)],
        );

        let summary = summarize(&tree);

        assert_eq!(names(&summary.tree), vec!["README.md", "docs", "package.json", "public", "src"]);
        let src = &summary.tree[4];
        assert_eq!(src.node_type, NodeType::Directory);
        assert_eq!(names(src.children.as_ref().unwrap()), vec!["api", "index.ts"]);
        assert_eq!(summary.tree[2].size, 120);
        assert_eq!(summary.common_directories, vec!["api", "docs", "public", "src"]);
        assert!(summary.has_directory("public"));
    }

    #[test]
    fn test_level_limit_and_hidden_entries() {
        let tree = tree_of(
            &["a", "a/b", "a/b/c", "a/b/c/d", "a/b/c/d/e", ".github", ".github/workflows"],
            &[("a/b/c/d/deep.txt", 1), ("a/b/c/d/e/deeper.txt", 1), (".github/workflows/ci.yml", 1)],
        );

        let summary = summarize(&tree);

        assert_eq!(names(&summary.tree), vec!["a"]);
        let c = &summary.tree[0].children.as_ref().unwrap()[0].children.as_ref().unwrap()[0];
        assert_eq!(c.name, "c");
        let d = &c.children.as_ref().unwrap()[0];
        assert_eq!(d.name, "d");
        assert!(d.children.is_none());
        assert_eq!(summary.common_directories, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_wide_directory_counts_omitted() {
        let files: Vec<(String, u64)> = (0..MAX_ENTRIES_PER_DIR + 5)
            .map(|i| (format!("assets/img{:03}.png", i), 1))
            .collect();
        let refs: Vec<(&str, u64)> = files.iter().map(|(p, s)| (p.as_str(), *s)).collect();
        let tree = tree_of(&["assets"], &refs);

        let summary = summarize(&tree);
        let assets = &summary.tree[0];
        assert_eq!(assets.children.as_ref().unwrap().len(), MAX_ENTRIES_PER_DIR);
        assert_eq!(assets.omitted, 5);
    }

    #[test]
    fn test_empty_tree() {
        let summary = summarize(&tree_of(&[], &[]));
        assert!(summary.tree.is_empty());
        assert!(summary.common_directories.is_empty());
    }
}
