//! Manifest extractor: parses every recognized manifest in the tree.
//!
//! All successfully parsed manifests are returned, at every depth; picking
//! the winner per ecosystem is the resolver's job. Malformed or unreadable
//! manifests become degraded notes.

use rayon::prelude::*;

use crate::dependencies::{Ecosystem, ManifestRegistry, ManifestSignal};
use crate::report::AnalysisNote;
use crate::tree::{FileNode, ProjectTree};

const COMPONENT: &str = "manifest";

pub fn extract(tree: &ProjectTree, registry: &ManifestRegistry) -> (Vec<ManifestSignal>, Vec<AnalysisNote>) {
    let candidates: Vec<&FileNode> = tree
        .files
        .iter()
        .filter(|f| registry.find_for_manifest(f.file_name()).is_some())
        .collect();

    let results: Vec<Result<ManifestSignal, AnalysisNote>> = candidates
        .par_iter()
        .map(|file| parse_one(tree, registry, file))
        .collect();

    let mut manifests = Vec::new();
    let mut notes = Vec::new();
    for result in results {
        match result {
            Ok(signal) => manifests.push(signal),
            Err(note) => notes.push(note),
        }
    }

    manifests.sort_by(|a, b| {
        a.ecosystem
            .cmp(&b.ecosystem)
            .then_with(|| a.depth().cmp(&b.depth()))
            .then_with(|| a.manifest_path.cmp(&b.manifest_path))
    });

    (manifests, notes)
}

fn parse_one(
    tree: &ProjectTree,
    registry: &ManifestRegistry,
    file: &FileNode,
) -> Result<ManifestSignal, AnalysisNote> {
    let path = file.relative_path.as_str();

    let Some(content) = tree.content(path) else {
        let reason = if file.oversized {
            "manifest exceeds the per-file read limit and was not parsed"
        } else {
            "manifest content was not read and could not be parsed"
        };
        tracing::warn!(path, "{}", reason);
        return Err(AnalysisNote::degraded(COMPONENT, reason).with_path(path));
    };

    match registry.parse_manifest(path, content) {
        Ok(mut signal) => {
            complete_from_tree(&mut signal, tree);
            tracing::debug!(
                path,
                ecosystem = signal.ecosystem.as_str(),
                dependencies = signal.dependency_count(),
                "parsed manifest"
            );
            Ok(signal)
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "skipping malformed manifest");
            Err(AnalysisNote::degraded(COMPONENT, format!("malformed manifest: {}", e)).with_path(path))
        }
    }
}

/// Fills in targets that follow from file layout rather than manifest keys.
fn complete_from_tree(signal: &mut ManifestSignal, tree: &ProjectTree) {
    let dir = signal.dir().to_string();

    match signal.ecosystem {
        Ecosystem::Cargo if signal.name.is_some() => {
            if tree.has_file(&join(&dir, "src/lib.rs")) {
                signal.library = true;
            }
            if tree.has_file(&join(&dir, "src/main.rs")) {
                if let Some(name) = signal.name.clone() {
                    signal.binaries.push(name);
                }
            }
            let bin_dir = join(&dir, "src/bin");
            for file in tree.files_in(&bin_dir) {
                if let Some(stem) = file.file_name().strip_suffix(".rs") {
                    signal.binaries.push(stem.to_string());
                }
            }
        }
        Ecosystem::Go => {
            if tree.has_file(&join(&dir, "main.go")) {
                let module = signal.name.as_deref().unwrap_or("main");
                let bin = module.rsplit('/').next().unwrap_or(module);
                signal.binaries.push(bin.to_string());
            }
            let cmd_prefix = format!("{}/", join(&dir, "cmd"));
            for file in tree.files_named("main.go") {
                if let Some(rest) = file.parent_dir().strip_prefix(&cmd_prefix) {
                    if !rest.contains('/') {
                        signal.binaries.push(rest.to_string());
                    }
                }
            }
        }
        _ => {}
    }

    signal.binaries.sort();
    signal.binaries.dedup();
}

/// Joins a manifest directory (`""` at the root) with a relative path.
pub(crate) fn join(dir: &str, rel: &str) -> String {
    if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", dir, rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoteSeverity;
    use std::path::PathBuf;

    fn add(tree: &mut ProjectTree, path: &str, content: Option<&str>) {
        tree.files.push(FileNode {
            relative_path: path.to_string(),
            size_bytes: content.map_or(10, |c| c.len() as u64),
            extension: path.rsplit_once('.').map(|(_, e)| e.to_lowercase()),
            modified_at: None,
            oversized: content.is_none(),
        });
        if let Some(content) = content {
            tree.insert_content(path.to_string(), content.to_string());
        }
    }

    #[test]
    fn test_extract_all_depths_and_notes() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        add(&mut tree, "package.json", Some(r#"{"name": "root"}"#));
        add(&mut tree, "web/package.json", Some(r#"{"name": "web"}"#));
        add(&mut tree, "broken/package.json", Some("{ nope"));
        add(&mut tree, "huge/pom.xml", None);
        add(&mut tree, "README.md", Some("# hi"));

        let (manifests, notes) = extract(&tree, &ManifestRegistry::with_defaults());

        let paths: Vec<&str> = manifests.iter().map(|m| m.manifest_path.as_str()).collect();
        assert_eq!(paths, vec!["package.json", "web/package.json"]);
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.severity == NoteSeverity::Degraded));
        assert!(notes.iter().any(|n| n.path.as_deref() == Some("broken/package.json")));
        assert!(notes.iter().any(|n| n.path.as_deref() == Some("huge/pom.xml")));
    }

    #[test]
    fn test_cargo_layout_targets() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        add(&mut tree, "Cargo.toml", Some("[package]\nname = \"tool\"\n"));
        add(&mut tree, "src/main.rs", Some("fn main() {}"));
        add(&mut tree, "src/lib.rs", Some(""));
        add(&mut tree, "src/bin/helper.rs", Some("fn main() {}"));

        let (manifests, _) = extract(&tree, &ManifestRegistry::with_defaults());
        assert!(manifests[0].library);
        assert_eq!(manifests[0].binaries, vec!["helper", "tool"]);
    }

    #[test]
    fn test_go_cmd_binaries() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        add(&mut tree, "go.mod", Some("module github.com/acme/svc\n"));
        add(&mut tree, "cmd/api/main.go", Some("package main"));
        add(&mut tree, "cmd/worker/main.go", Some("package main"));

        let (manifests, _) = extract(&tree, &ManifestRegistry::with_defaults());
        assert_eq!(manifests[0].binaries, vec!["api", "worker"]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "src/lib.rs"), "src/lib.rs");
        assert_eq!(join("crates/a", "src/lib.rs"), "crates/a/src/lib.rs");
    }
}
