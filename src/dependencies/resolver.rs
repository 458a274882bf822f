//! Manifest parser trait and registry.

use std::collections::HashMap;

use crate::error::{ExtractError, ExtractResult};

use super::{Ecosystem, ManifestSignal};

/// Parses the manifests of one ecosystem from already-read content.
pub trait ManifestParser: Send + Sync {
    /// Returns the ecosystem this parser handles.
    fn ecosystem(&self) -> Ecosystem;

    /// Returns the manifest file names this parser can read, in priority order.
    fn manifest_names(&self) -> &[&str] {
        self.ecosystem().manifest_names()
    }

    /// Checks if this parser can handle the given file name.
    fn can_handle(&self, file_name: &str) -> bool {
        self.manifest_names().contains(&file_name)
    }

    /// Rank of a manifest name within the ecosystem; lower wins.
    fn priority(&self, file_name: &str) -> usize {
        self.manifest_names()
            .iter()
            .position(|n| *n == file_name)
            .unwrap_or(usize::MAX)
    }

    /// Parses manifest content found at `path` (relative to the root).
    fn parse(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal>;
}

/// Registry for manifest parsers.
pub struct ManifestRegistry {
    parsers: HashMap<Ecosystem, Box<dyn ManifestParser>>,
}

impl ManifestRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Creates a registry with all built-in parsers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(super::npm::NpmParser::new()));
        registry.register(Box::new(super::python::PythonParser::new()));
        registry.register(Box::new(super::cargo::CargoParser::new()));
        registry.register(Box::new(super::maven::MavenParser::new()));
        registry.register(Box::new(super::gradle::GradleParser::new()));
        registry.register(Box::new(super::go::GoModParser::new()));
        registry.register(Box::new(super::composer::ComposerParser::new()));
        registry.register(Box::new(super::ruby::GemfileParser::new()));
        registry.register(Box::new(super::dotnet::DotnetParser::new()));
        registry.register(Box::new(super::dart::PubspecParser::new()));
        registry
    }

    /// Registers a parser for an ecosystem.
    pub fn register(&mut self, parser: Box<dyn ManifestParser>) {
        self.parsers.insert(parser.ecosystem(), parser);
    }

    /// Gets the parser for an ecosystem.
    pub fn get(&self, ecosystem: Ecosystem) -> Option<&dyn ManifestParser> {
        self.parsers.get(&ecosystem).map(|p| p.as_ref())
    }

    /// Finds a parser that can handle the given manifest file name.
    pub fn find_for_manifest(&self, file_name: &str) -> Option<&dyn ManifestParser> {
        self.parsers
            .values()
            .find(|p| p.can_handle(file_name))
            .map(|p| p.as_ref())
    }

    /// Parses a manifest using the appropriate parser.
    pub fn parse_manifest(&self, path: &str, content: &str) -> ExtractResult<ManifestSignal> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match self.find_for_manifest(file_name) {
            Some(parser) => parser.parse(path, content),
            None => Err(ExtractError::Invalid(format!(
                "no parser found for manifest: {}",
                path
            ))),
        }
    }

    /// Returns all registered ecosystems, sorted.
    pub fn ecosystems(&self) -> Vec<Ecosystem> {
        let mut ecosystems: Vec<_> = self.parsers.keys().copied().collect();
        ecosystems.sort();
        ecosystems
    }
}

impl Default for ManifestRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_new() {
        let registry = ManifestRegistry::new();
        assert!(registry.ecosystems().is_empty());
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ManifestRegistry::with_defaults();
        assert_eq!(registry.ecosystems(), Ecosystem::ALL.to_vec());
    }

    #[test]
    fn test_find_for_manifest() {
        let registry = ManifestRegistry::with_defaults();
        let eco = |name: &str| registry.find_for_manifest(name).map(|p| p.ecosystem());

        assert_eq!(eco("package.json"), Some(Ecosystem::Npm));
        assert_eq!(eco("requirements.txt"), Some(Ecosystem::Pip));
        assert_eq!(eco("build.gradle.kts"), Some(Ecosystem::Gradle));
        assert_eq!(eco("Api.csproj"), Some(Ecosystem::Nuget));
        assert_eq!(eco("README.md"), None);
    }

    #[test]
    fn test_priority() {
        let registry = ManifestRegistry::with_defaults();
        let pip = registry.get(Ecosystem::Pip).unwrap();
        assert!(pip.priority("pyproject.toml") < pip.priority("Pipfile"));
        assert!(pip.priority("Pipfile") < pip.priority("requirements.txt"));
    }

    #[test]
    fn test_parse_unknown_manifest_errors() {
        let registry = ManifestRegistry::with_defaults();
        assert!(registry.parse_manifest("notes.txt", "").is_err());
    }
}
