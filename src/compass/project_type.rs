//! Project type classification.

use serde::{Deserialize, Serialize};

use crate::dependencies::ManifestSignal;
use crate::languages::{LanguageKind, REGISTRY};
use crate::signals::language::source_language;
use crate::signals::{FrameworkCategory, FrameworkSignal};
use crate::tree::ProjectTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    MobileApplication,
    DesktopApplication,
    FullStackApplication,
    WebApplication,
    ApiService,
    CliTool,
    Library,
    StaticWebsite,
    Documentation,
    Unclassified,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::MobileApplication => "mobile_application",
            ProjectType::DesktopApplication => "desktop_application",
            ProjectType::FullStackApplication => "full_stack_application",
            ProjectType::WebApplication => "web_application",
            ProjectType::ApiService => "api_service",
            ProjectType::CliTool => "cli_tool",
            ProjectType::Library => "library",
            ProjectType::StaticWebsite => "static_website",
            ProjectType::Documentation => "documentation",
            ProjectType::Unclassified => "unclassified",
        }
    }
}

impl Default for ProjectType {
    fn default() -> Self {
        ProjectType::Unclassified
    }
}

/// Decision table over resolved frameworks and the selected manifests; the
/// first matching row wins.
pub fn classify(frameworks: &[FrameworkSignal], manifests: &[ManifestSignal], tree: &ProjectTree) -> ProjectType {
    let has = |category: FrameworkCategory| frameworks.iter().any(|f| f.category == category);

    if has(FrameworkCategory::Mobile) {
        ProjectType::MobileApplication
    } else if has(FrameworkCategory::Desktop) {
        ProjectType::DesktopApplication
    } else if has(FrameworkCategory::Frontend) && has(FrameworkCategory::Backend) {
        ProjectType::FullStackApplication
    } else if has(FrameworkCategory::Fullstack) {
        ProjectType::WebApplication
    } else if has(FrameworkCategory::Backend) {
        ProjectType::ApiService
    } else if has(FrameworkCategory::Frontend) {
        ProjectType::WebApplication
    } else if has(FrameworkCategory::Cli) || manifests.iter().any(|m| !m.binaries.is_empty()) {
        ProjectType::CliTool
    } else if manifests.iter().any(|m| m.library) {
        ProjectType::Library
    } else if tree.has_file("index.html") {
        ProjectType::StaticWebsite
    } else if manifests.is_empty() && is_documentation_only(tree) {
        ProjectType::Documentation
    } else {
        ProjectType::Unclassified
    }
}

/// At least one prose file and no source files.
fn is_documentation_only(tree: &ProjectTree) -> bool {
    let mut prose = false;
    for file in &tree.files {
        if source_language(file, tree.content(&file.relative_path)).is_some() {
            return false;
        }
        if REGISTRY
            .detect(file, None)
            .and_then(|lang| REGISTRY.kind_of(lang))
            == Some(LanguageKind::Prose)
        {
            prose = true;
        }
    }
    prose
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::Ecosystem;
    use crate::signals::{Confidence, Evidence, EvidenceKind};
    use crate::tree::FileNode;
    use std::path::PathBuf;

    fn framework(name: &str, category: FrameworkCategory) -> FrameworkSignal {
        FrameworkSignal {
            name: name.to_string(),
            ecosystem: Ecosystem::Npm,
            category,
            confidence: Confidence::Medium,
            evidence: vec![Evidence {
                kind: EvidenceKind::Dependency,
                source: "package.json".to_string(),
            }],
        }
    }

    fn tree_with(paths: &[&str]) -> ProjectTree {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        for path in paths {
            tree.files.push(FileNode {
                relative_path: path.to_string(),
                size_bytes: 10,
                extension: path.rsplit_once('.').map(|(_, e)| e.to_lowercase()),
                modified_at: None,
                oversized: false,
            });
        }
        tree
    }

    #[test]
    fn test_framework_rows() {
        let tree = tree_with(&[]);
        let react = framework("react", FrameworkCategory::Frontend);
        let express = framework("express", FrameworkCategory::Backend);
        let rn = framework("react-native", FrameworkCategory::Mobile);

        assert_eq!(classify(&[react.clone()], &[], &tree), ProjectType::WebApplication);
        assert_eq!(classify(&[express.clone()], &[], &tree), ProjectType::ApiService);
        assert_eq!(
            classify(&[react.clone(), express], &[], &tree),
            ProjectType::FullStackApplication
        );
        assert_eq!(classify(&[react, rn], &[], &tree), ProjectType::MobileApplication);
    }

    #[test]
    fn test_testing_frameworks_do_not_classify() {
        let tree = tree_with(&[]);
        let jest = framework("jest", FrameworkCategory::Testing);
        assert_eq!(classify(&[jest], &[], &tree), ProjectType::Unclassified);
    }

    #[test]
    fn test_manifest_targets() {
        let tree = tree_with(&[]);
        let mut bin = ManifestSignal::new(Ecosystem::Cargo, "Cargo.toml");
        bin.binaries.push("tool".into());
        bin.library = true;
        assert_eq!(classify(&[], &[bin], &tree), ProjectType::CliTool);

        let mut lib = ManifestSignal::new(Ecosystem::Cargo, "Cargo.toml");
        lib.library = true;
        assert_eq!(classify(&[], &[lib], &tree), ProjectType::Library);
    }

    #[test]
    fn test_static_site_and_docs() {
        let site = tree_with(&["index.html", "style.css"]);
        assert_eq!(classify(&[], &[], &site), ProjectType::StaticWebsite);

        let docs = tree_with(&["README.md", "guide/intro.md", "logo.png"]);
        assert_eq!(classify(&[], &[], &docs), ProjectType::Documentation);

        let code = tree_with(&["README.md", "main.py"]);
        assert_eq!(classify(&[], &[], &code), ProjectType::Unclassified);

        assert_eq!(classify(&[], &[], &tree_with(&[])), ProjectType::Unclassified);
    }

    #[test]
    fn test_as_str_matches_serde() {
        assert_eq!(
            serde_json::to_string(&ProjectType::FullStackApplication).unwrap(),
            format!("\"{}\"", ProjectType::FullStackApplication.as_str())
        );
    }
}
