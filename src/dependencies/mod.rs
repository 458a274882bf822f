//! Manifest parsing per package ecosystem.
//!
//! This module provides support for reading declared project metadata:
//! - Dependency names and version specs (runtime and development)
//! - Declared scripts/tasks
//! - Binary and library targets
//!
//! Manifests are parsed as structured text only; nothing is resolved,
//! installed or evaluated.

pub mod cargo;
pub mod composer;
pub mod dart;
pub mod dotnet;
pub mod go;
pub mod gradle;
pub mod maven;
pub mod npm;
pub mod python;
pub mod resolver;
pub mod ruby;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Supported package ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    Npm,
    Pip,
    Cargo,
    Maven,
    Gradle,
    Go,
    Composer,
    Bundler,
    Nuget,
    Pub,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 10] = [
        Ecosystem::Npm,
        Ecosystem::Pip,
        Ecosystem::Cargo,
        Ecosystem::Maven,
        Ecosystem::Gradle,
        Ecosystem::Go,
        Ecosystem::Composer,
        Ecosystem::Bundler,
        Ecosystem::Nuget,
        Ecosystem::Pub,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Cargo => "cargo",
            Ecosystem::Maven => "maven",
            Ecosystem::Gradle => "gradle",
            Ecosystem::Go => "go",
            Ecosystem::Composer => "composer",
            Ecosystem::Bundler => "bundler",
            Ecosystem::Nuget => "nuget",
            Ecosystem::Pub => "pub",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "npm" | "node" | "nodejs" | "yarn" | "pnpm" => Some(Ecosystem::Npm),
            "pip" | "python" | "pypi" | "poetry" | "pipenv" => Some(Ecosystem::Pip),
            "cargo" | "rust" => Some(Ecosystem::Cargo),
            "maven" => Some(Ecosystem::Maven),
            "gradle" => Some(Ecosystem::Gradle),
            "go" | "golang" => Some(Ecosystem::Go),
            "composer" | "php" => Some(Ecosystem::Composer),
            "bundler" | "ruby" | "rubygems" => Some(Ecosystem::Bundler),
            "nuget" | "dotnet" | ".net" => Some(Ecosystem::Nuget),
            "pub" | "dart" | "flutter" => Some(Ecosystem::Pub),
            _ => None,
        }
    }

    /// Manifest file names in priority order: at equal depth the earlier
    /// name wins.
    pub fn manifest_names(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Npm => &["package.json"],
            Ecosystem::Pip => &["pyproject.toml", "Pipfile", "requirements.txt"],
            Ecosystem::Cargo => &["Cargo.toml"],
            Ecosystem::Maven => &["pom.xml"],
            Ecosystem::Gradle => &["build.gradle.kts", "build.gradle"],
            Ecosystem::Go => &["go.mod"],
            Ecosystem::Composer => &["composer.json"],
            Ecosystem::Bundler => &["Gemfile"],
            Ecosystem::Nuget => &["*.csproj", "*.fsproj"],
            Ecosystem::Pub => &["pubspec.yaml"],
        }
    }
}

/// Declared metadata from the manifest that won for one ecosystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSignal {
    pub ecosystem: Ecosystem,
    pub manifest_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Runtime dependencies: name to version spec
    pub declared_dependencies: BTreeMap<String, String>,
    /// Development, test and build-only dependencies
    pub dev_dependencies: BTreeMap<String, String>,
    /// Scripts or tasks: name to command
    pub declared_scripts: BTreeMap<String, String>,
    /// Executable targets the manifest declares
    pub binaries: Vec<String>,
    /// Whether the manifest describes an importable library
    pub library: bool,
    /// Build plugins or SDKs (Gradle/Maven plugins, MSBuild SDK)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
}

impl ManifestSignal {
    pub fn new(ecosystem: Ecosystem, manifest_path: impl Into<String>) -> Self {
        Self {
            ecosystem,
            manifest_path: manifest_path.into(),
            name: None,
            version: None,
            declared_dependencies: BTreeMap::new(),
            dev_dependencies: BTreeMap::new(),
            declared_scripts: BTreeMap::new(),
            binaries: Vec::new(),
            library: false,
            plugins: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn file_name(&self) -> &str {
        self.manifest_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.manifest_path)
    }

    /// Directory holding the manifest, `""` at the root.
    pub fn dir(&self) -> &str {
        crate::tree::parent_of(&self.manifest_path)
    }

    pub fn depth(&self) -> usize {
        crate::tree::path_depth(&self.manifest_path)
    }

    pub fn dependency_count(&self) -> usize {
        self.declared_dependencies.len() + self.dev_dependencies.len()
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.declared_dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }

    /// Runtime then dev dependency names, each flagged with `is_dev`.
    pub fn dependency_names(&self) -> impl Iterator<Item = (&str, bool)> {
        self.declared_dependencies
            .keys()
            .map(|n| (n.as_str(), false))
            .chain(self.dev_dependencies.keys().map(|n| (n.as_str(), true)))
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.iter().any(|p| p == id)
    }
}

// Re-export commonly used types
pub use resolver::{ManifestParser, ManifestRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_as_str() {
        assert_eq!(Ecosystem::Cargo.as_str(), "cargo");
        assert_eq!(Ecosystem::Npm.as_str(), "npm");
        assert_eq!(Ecosystem::Pip.as_str(), "pip");
        assert_eq!(Ecosystem::Nuget.as_str(), "nuget");
    }

    #[test]
    fn test_ecosystem_from_str() {
        assert_eq!(Ecosystem::from_str("rust"), Some(Ecosystem::Cargo));
        assert_eq!(Ecosystem::from_str("node"), Some(Ecosystem::Npm));
        assert_eq!(Ecosystem::from_str("Poetry"), Some(Ecosystem::Pip));
        assert_eq!(Ecosystem::from_str("flutter"), Some(Ecosystem::Pub));
        assert_eq!(Ecosystem::from_str("unknown"), None);
    }

    #[test]
    fn test_round_trip_names() {
        for eco in Ecosystem::ALL {
            assert_eq!(Ecosystem::from_str(eco.as_str()), Some(eco));
        }
    }

    #[test]
    fn test_manifest_priority_order() {
        assert_eq!(
            Ecosystem::Pip.manifest_names(),
            &["pyproject.toml", "Pipfile", "requirements.txt"]
        );
        assert_eq!(Ecosystem::Npm.manifest_names(), &["package.json"]);
    }

    #[test]
    fn test_manifest_signal_helpers() {
        let mut signal = ManifestSignal::new(Ecosystem::Npm, "web/package.json").with_name("web");
        signal.declared_dependencies.insert("react".into(), "^18".into());
        signal.dev_dependencies.insert("vite".into(), "^5".into());

        assert_eq!(signal.file_name(), "package.json");
        assert_eq!(signal.dir(), "web");
        assert_eq!(signal.depth(), 1);
        assert_eq!(signal.dependency_count(), 2);
        assert!(signal.has_dependency("vite"));
        assert_eq!(
            signal.dependency_names().collect::<Vec<_>>(),
            vec![("react", false), ("vite", true)]
        );
    }
}
