//! Workspace support for multi-module projects.
//!
//! This module detects, from root manifests already in the tree:
//! - Cargo workspaces
//! - NPM/Yarn/pnpm workspaces
//! - Gradle multi-project builds
//! - Maven multi-module builds
//!
//! Member patterns are resolved against the walked directory index; nothing
//! is read from disk here.

pub mod cargo;
pub mod detector;
pub mod npm;

use serde::{Deserialize, Serialize};

pub use detector::WorkspaceDetector;

/// Represents a workspace containing multiple modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    /// Type of workspace
    pub workspace_type: WorkspaceType,
    /// Root manifest that declares the members
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,
    /// Workspace name (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Modules in the workspace, ordered by path
    pub members: Vec<ModuleInfo>,
}

impl WorkspaceInfo {
    pub fn new(workspace_type: WorkspaceType) -> Self {
        Self {
            workspace_type,
            manifest_path: None,
            name: None,
            members: Vec::new(),
        }
    }

    pub fn single_project() -> Self {
        Self::new(WorkspaceType::SingleProject)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_workspace(&self) -> bool {
        self.workspace_type != WorkspaceType::SingleProject
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&ModuleInfo> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Get all module names
    pub fn module_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }
}

impl Default for WorkspaceInfo {
    fn default() -> Self {
        Self::single_project()
    }
}

/// Information about a module within a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Module name
    pub name: String,
    /// Directory relative to the analysis root
    pub path: String,
    /// Dependencies on other modules in the workspace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_dependencies: Vec<String>,
    /// Dominant source language of the module
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Module type (library, binary, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_type: Option<ModuleType>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            internal_dependencies: Vec::new(),
            language: None,
            module_type: None,
        }
    }
}

/// Type of workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceType {
    /// Cargo workspace (Rust)
    CargoWorkspace,
    /// NPM/Yarn/pnpm workspace (JavaScript/TypeScript)
    NpmWorkspace,
    /// Gradle multi-project build (Java/Kotlin)
    GradleMultiProject,
    /// Maven multi-module project (Java)
    MavenMultiModule,
    /// Single project (not a workspace)
    SingleProject,
}

impl WorkspaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceType::CargoWorkspace => "cargo_workspace",
            WorkspaceType::NpmWorkspace => "npm_workspace",
            WorkspaceType::GradleMultiProject => "gradle_multi_project",
            WorkspaceType::MavenMultiModule => "maven_multi_module",
            WorkspaceType::SingleProject => "single_project",
        }
    }
}

/// Type of module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Library,
    Binary,
    /// Both a library and at least one binary
    Application,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Library => "library",
            ModuleType::Binary => "binary",
            ModuleType::Application => "application",
        }
    }

    pub fn from_targets(library: bool, has_binaries: bool) -> Option<Self> {
        match (library, has_binaries) {
            (true, true) => Some(ModuleType::Application),
            (false, true) => Some(ModuleType::Binary),
            (true, false) => Some(ModuleType::Library),
            (false, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_type_as_str() {
        assert_eq!(WorkspaceType::CargoWorkspace.as_str(), "cargo_workspace");
        assert_eq!(WorkspaceType::NpmWorkspace.as_str(), "npm_workspace");
        assert_eq!(WorkspaceType::GradleMultiProject.as_str(), "gradle_multi_project");
        assert_eq!(WorkspaceType::SingleProject.as_str(), "single_project");
    }

    #[test]
    fn test_workspace_type_serializes_like_as_str() {
        let json = serde_json::to_string(&WorkspaceType::MavenMultiModule).unwrap();
        assert_eq!(json, "\"maven_multi_module\"");
    }

    #[test]
    fn test_single_project_is_not_workspace() {
        assert!(!WorkspaceInfo::default().is_workspace());
        assert!(WorkspaceInfo::new(WorkspaceType::CargoWorkspace).is_workspace());
    }

    #[test]
    fn test_module_type_from_targets() {
        assert_eq!(ModuleType::from_targets(true, true), Some(ModuleType::Application));
        assert_eq!(ModuleType::from_targets(false, true), Some(ModuleType::Binary));
        assert_eq!(ModuleType::from_targets(true, false), Some(ModuleType::Library));
        assert_eq!(ModuleType::from_targets(false, false), None);
    }
}
