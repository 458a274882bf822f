//! Profile builder: merges extractor output into the resolved profile.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dependencies::{Ecosystem, ManifestRegistry, ManifestSignal};
use crate::languages::{REGISTRY, UNKNOWN};
use crate::signals::{BuildSource, BuildSystemSignal, FrameworkCategory, FrameworkSignal, LanguageSignal, Signals};
use crate::tree::ProjectTree;

use super::project_type::{self, ProjectType};

/// Languages below this share of total bytes are not reported as secondary.
const SECONDARY_MIN_PERCENT: f64 = 1.0;

/// Language statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStats {
    /// Language name
    pub name: String,
    /// Bytes attributed to the language
    pub bytes: u64,
    /// Number of files
    pub files: usize,
    /// Percentage of total bytes, one decimal
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSummary {
    pub primary: String,
    pub secondary: Vec<String>,
    pub stats: Vec<LanguageStats>,
}

impl Default for LanguageSummary {
    fn default() -> Self {
        Self {
            primary: UNKNOWN.to_string(),
            secondary: Vec::new(),
            stats: Vec::new(),
        }
    }
}

/// The resolved profile every downstream stage consumes.
#[derive(Debug, Clone)]
pub struct ProjectProfile {
    pub languages: LanguageSummary,
    /// Winning manifest per ecosystem, ordered by ecosystem
    pub manifests: Vec<ManifestSignal>,
    pub frameworks: Vec<FrameworkSignal>,
    pub build_systems: Vec<BuildSystemSignal>,
    pub project_type: ProjectType,
}

impl ProjectProfile {
    pub fn manifest(&self, ecosystem: Ecosystem) -> Option<&ManifestSignal> {
        self.manifests.iter().find(|m| m.ecosystem == ecosystem)
    }

    pub fn has_build_system(&self, name: &str) -> bool {
        self.build_systems.iter().any(|b| b.name == name)
    }

    /// Ecosystems of the primary language, in preference order.
    pub fn primary_ecosystems(&self) -> &'static [Ecosystem] {
        REGISTRY.ecosystems_of(&self.languages.primary)
    }

    pub fn testing_frameworks(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .frameworks
            .iter()
            .filter(|f| f.category == FrameworkCategory::Testing)
            .map(|f| f.name.as_str())
            .collect();
        names.into_iter().map(String::from).collect()
    }

    pub fn total_dependencies(&self) -> usize {
        self.manifests.iter().map(|m| m.dependency_count()).sum()
    }
}

/// Builds the resolved profile from raw signals.
pub struct ProfileBuilder<'a> {
    registry: &'a ManifestRegistry,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(registry: &'a ManifestRegistry) -> Self {
        Self { registry }
    }

    pub fn build(&self, signals: &Signals, tree: &ProjectTree) -> ProjectProfile {
        let manifests = self.select_manifests(&signals.manifests);
        let languages = summarize_languages(&signals.languages, &manifests);
        let frameworks = merge_frameworks(&signals.frameworks);
        let build_systems = dedup_build_systems(&signals.build_systems);
        let project_type = project_type::classify(&frameworks, &manifests, tree);

        tracing::debug!(
            primary = %languages.primary,
            manifests = manifests.len(),
            frameworks = frameworks.len(),
            build_systems = build_systems.len(),
            project_type = project_type.as_str(),
            "resolved profile"
        );

        ProjectProfile {
            languages,
            manifests,
            frameworks,
            build_systems,
            project_type,
        }
    }

    /// One manifest per ecosystem: fewest path components, then manifest-name
    /// priority, then lexical path.
    fn select_manifests(&self, manifests: &[ManifestSignal]) -> Vec<ManifestSignal> {
        let mut best: BTreeMap<Ecosystem, &ManifestSignal> = BTreeMap::new();

        for manifest in manifests {
            let replace = match best.get(&manifest.ecosystem) {
                None => true,
                Some(current) => self.selection_key(manifest) < self.selection_key(current),
            };
            if replace {
                best.insert(manifest.ecosystem, manifest);
            }
        }

        best.into_values().cloned().collect()
    }

    fn selection_key<'m>(&self, manifest: &'m ManifestSignal) -> (usize, usize, &'m str) {
        let priority = self
            .registry
            .get(manifest.ecosystem)
            .map_or(usize::MAX, |p| p.priority(manifest.file_name()));
        (manifest.depth(), priority, manifest.manifest_path.as_str())
    }
}

fn summarize_languages(signal: &LanguageSignal, manifests: &[ManifestSignal]) -> LanguageSummary {
    let total = signal.total_bytes();
    let has_manifest = |language: &str| {
        REGISTRY
            .ecosystems_of(language)
            .iter()
            .any(|eco| manifests.iter().any(|m| m.ecosystem == *eco))
    };

    // bytes desc, matching manifest first, then name
    let mut ranked: Vec<(&str, u64)> = signal
        .bytes
        .iter()
        .filter(|(name, _)| name.as_str() != UNKNOWN)
        .map(|(name, bytes)| (name.as_str(), *bytes))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| has_manifest(b.0).cmp(&has_manifest(a.0)))
            .then_with(|| a.0.cmp(b.0))
    });

    let primary = ranked
        .first()
        .map_or_else(|| UNKNOWN.to_string(), |(name, _)| name.to_string());

    let secondary = ranked
        .iter()
        .skip(1)
        .filter(|(_, bytes)| total > 0 && percent(*bytes, total) >= SECONDARY_MIN_PERCENT)
        .map(|(name, _)| name.to_string())
        .collect();

    let mut stats: Vec<LanguageStats> = signal
        .bytes
        .iter()
        .map(|(name, bytes)| LanguageStats {
            name: name.clone(),
            bytes: *bytes,
            files: signal.files.get(name).copied().unwrap_or(0),
            percentage: if total > 0 {
                (percent(*bytes, total) * 10.0).round() / 10.0
            } else {
                0.0
            },
        })
        .collect();
    stats.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));

    LanguageSummary {
        primary,
        secondary,
        stats,
    }
}

fn percent(part: u64, total: u64) -> f64 {
    part as f64 * 100.0 / total as f64
}

/// Merges duplicates per `(name, ecosystem)`. Evidence is unioned and the
/// highest confidence kept; agreement of two distinct evidence kinds raises
/// it one level.
pub fn merge_frameworks(frameworks: &[FrameworkSignal]) -> Vec<FrameworkSignal> {
    let mut merged: BTreeMap<(String, Ecosystem), FrameworkSignal> = BTreeMap::new();

    for framework in frameworks {
        merged
            .entry((framework.name.clone(), framework.ecosystem))
            .and_modify(|existing| {
                existing.confidence = existing.confidence.max(framework.confidence);
                existing.evidence.extend(framework.evidence.iter().cloned());
            })
            .or_insert_with(|| framework.clone());
    }

    let mut result: Vec<FrameworkSignal> = merged
        .into_values()
        .map(|mut framework| {
            framework.evidence.sort();
            framework.evidence.dedup();
            let kinds: BTreeSet<_> = framework.evidence.iter().map(|e| e.kind).collect();
            if kinds.len() >= 2 {
                framework.confidence = framework.confidence.raised();
            }
            framework
        })
        .collect();

    result.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.ecosystem.cmp(&b.ecosystem))
    });
    result
}

/// One entry per tool name: closest to root, then config file over lockfile
/// over package script, then path.
pub fn dedup_build_systems(build_systems: &[BuildSystemSignal]) -> Vec<BuildSystemSignal> {
    let mut best: BTreeMap<&str, &BuildSystemSignal> = BTreeMap::new();

    for signal in build_systems {
        let replace = best
            .get(signal.name.as_str())
            .map_or(true, |current| build_key(signal) < build_key(current));
        if replace {
            best.insert(signal.name.as_str(), signal);
        }
    }

    best.into_values().cloned().collect()
}

fn build_key(signal: &BuildSystemSignal) -> (usize, BuildSource, &str) {
    (signal.depth(), signal.source, signal.config_file.as_str())
}
