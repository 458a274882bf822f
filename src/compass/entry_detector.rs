//! Entry point and important file detection.
//!
//! Both lists come from file names alone, ordered by depth then path.

use std::collections::BTreeMap;

use crate::dependencies::ManifestRegistry;
use crate::signals::build_system::is_build_file;
use crate::tree::{FileNode, ProjectTree};

/// Conventional entry file names across ecosystems.
const ENTRY_NAMES: &[&str] = &[
    "index.js",
    "index.ts",
    "main.py",
    "app.py",
    "server.js",
    "main.js",
    "main.ts",
    "App.tsx",
    "App.js",
    "main.go",
    "Main.java",
    "Program.cs",
    "main.cpp",
    "main.c",
    "main.rs",
    "manage.py",
];

const IMPORTANT_NAMES: &[&str] = &[
    ".env.example",
    ".editorconfig",
    ".gitignore",
    ".dockerignore",
    "tsconfig.json",
    "setup.py",
    "setup.cfg",
];

/// Prefixes matched case-insensitively (README.md, LICENSE-MIT, ...).
const IMPORTANT_PREFIXES: &[&str] = &["readme", "license", "licence", "changelog", "contributing"];

pub fn detect_entry_points(tree: &ProjectTree) -> Vec<String> {
    sorted_paths(tree.files.iter().filter(|f| ENTRY_NAMES.contains(&f.file_name())))
}

pub fn detect_important_files(tree: &ProjectTree, registry: &ManifestRegistry) -> Vec<String> {
    sorted_paths(tree.files.iter().filter(|f| is_important(f.file_name(), registry)))
}

fn is_important(name: &str, registry: &ManifestRegistry) -> bool {
    if registry.find_for_manifest(name).is_some() || is_build_file(name) {
        return true;
    }
    if IMPORTANT_NAMES.contains(&name) || name.starts_with("Dockerfile") {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    IMPORTANT_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Extension histogram; files without an extension count under `""`.
pub fn file_type_histogram(tree: &ProjectTree) -> BTreeMap<String, usize> {
    let mut histogram = BTreeMap::new();
    for file in &tree.files {
        let ext = file.extension().unwrap_or("").to_string();
        *histogram.entry(ext).or_insert(0) += 1;
    }
    histogram
}

fn sorted_paths<'a>(files: impl Iterator<Item = &'a FileNode>) -> Vec<String> {
    let mut found: Vec<&FileNode> = files.collect();
    found.sort_by(|a, b| {
        a.depth()
            .cmp(&b.depth())
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
    found.into_iter().map(|f| f.relative_path.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tree_with(paths: &[&str]) -> ProjectTree {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        for path in paths {
            tree.files.push(FileNode {
                relative_path: path.to_string(),
                size_bytes: 1,
                extension: path
                    .rsplit('/')
                    .next()
                    .and_then(|n| n.rsplit_once('.'))
                    .filter(|(stem, _)| !stem.is_empty())
                    .map(|(_, e)| e.to_lowercase()),
                modified_at: None,
                oversized: false,
            });
        }
        tree
    }

    #[test]
    fn test_entry_points_by_depth() {
        let tree = tree_with(&["src/main.rs", "web/src/index.ts", "main.py", "src/lib.rs", "app/App.tsx"]);
        assert_eq!(
            detect_entry_points(&tree),
            vec!["main.py", "app/App.tsx", "src/main.rs", "web/src/index.ts"]
        );
    }

    #[test]
    fn test_important_files() {
        let tree = tree_with(&[
            "README.md",
            "LICENSE",
            "package.json",
            "yarn.lock",
            "docker/Dockerfile.prod",
            "api/Api.csproj",
            "src/index.ts",
            "docs/CHANGELOG.md",
            ".env.example",
        ]);
        let registry = ManifestRegistry::with_defaults();
        assert_eq!(
            detect_important_files(&tree, &registry),
            vec![
                ".env.example",
                "LICENSE",
                "README.md",
                "package.json",
                "yarn.lock",
                "api/Api.csproj",
                "docker/Dockerfile.prod",
                "docs/CHANGELOG.md",
            ]
        );
    }

    #[test]
    fn test_file_type_histogram() {
        let tree = tree_with(&["a.ts", "b.ts", "Makefile", "c.py"]);
        let histogram = file_type_histogram(&tree);
        assert_eq!(histogram["ts"], 2);
        assert_eq!(histogram["py"], 1);
        assert_eq!(histogram[""], 1);
    }
}
