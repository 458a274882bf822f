//! Signal extractors.
//!
//! Each extractor reads the immutable [`ProjectTree`] (and the contents the
//! walker already loaded) and returns fresh signals. None of them executes
//! or imports anything found in the tree.

pub mod build_system;
pub mod framework;
pub mod language;
pub mod manifest;

use serde::{Deserialize, Serialize};

use crate::dependencies::{ManifestRegistry, ManifestSignal};
use crate::report::AnalysisNote;
use crate::tree::ProjectTree;

pub use build_system::{BuildSource, BuildSystemSignal};
pub use framework::{FrameworkCategory, FrameworkSignal};
pub use language::LanguageSignal;

/// Confidence attached to detections; ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }

    /// One level up, saturating at `High`.
    pub fn raised(self) -> Self {
        match self {
            Confidence::Low => Confidence::Medium,
            Confidence::Medium | Confidence::High => Confidence::High,
        }
    }
}

/// Where a detection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Dependency,
    MarkerFile,
    SourcePattern,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Dependency => "dependency",
            EvidenceKind::MarkerFile => "marker_file",
            EvidenceKind::SourcePattern => "source_pattern",
        }
    }

    pub fn base_confidence(&self) -> Confidence {
        match self {
            EvidenceKind::Dependency | EvidenceKind::MarkerFile => Confidence::Medium,
            EvidenceKind::SourcePattern => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub kind: EvidenceKind,
    /// File path, or `path: dependency` for manifest matches
    pub source: String,
}

/// Raw output of all extractors, before resolution.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub languages: LanguageSignal,
    /// Every manifest that parsed, all ecosystems and depths
    pub manifests: Vec<ManifestSignal>,
    pub frameworks: Vec<FrameworkSignal>,
    pub build_systems: Vec<BuildSystemSignal>,
    pub notes: Vec<AnalysisNote>,
}

/// Runs all extractors over the tree.
///
/// Language and manifest extraction are independent and run in parallel; the
/// framework and build-system extractors need the parsed manifests and run in
/// parallel after them.
pub fn extract_all(tree: &ProjectTree, registry: &ManifestRegistry) -> Signals {
    let (languages, (manifests, notes)) = rayon::join(
        || language::extract(tree),
        || manifest::extract(tree, registry),
    );
    tracing::debug!(
        languages = languages.bytes.len(),
        manifests = manifests.len(),
        "language and manifest extraction done"
    );

    let (frameworks, build_systems) = rayon::join(
        || framework::extract(tree, &manifests),
        || build_system::extract(tree, &manifests),
    );
    tracing::debug!(
        frameworks = frameworks.len(),
        build_systems = build_systems.len(),
        "framework and build-system extraction done"
    );

    Signals {
        languages,
        manifests,
        frameworks,
        build_systems,
        notes,
    }
}
