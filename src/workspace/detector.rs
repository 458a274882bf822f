//! Workspace type detection.

use std::collections::{BTreeMap, BTreeSet};

use crate::dependencies::{gradle, maven, Ecosystem, ManifestSignal};
use crate::languages::UNKNOWN;
use crate::signals::language::source_language;
use crate::tree::ProjectTree;

use super::{ModuleInfo, ModuleType, WorkspaceInfo, WorkspaceType};

/// Member declarations found in a root manifest, before resolution.
struct Declaration {
    workspace_type: WorkspaceType,
    manifest_path: &'static str,
    name: Option<String>,
    patterns: Vec<String>,
    exclude: Vec<String>,
    /// File that must exist in a member directory, if any
    member_marker: Option<&'static [&'static str]>,
    ecosystems: &'static [Ecosystem],
}

/// Detects workspace type and resolves its members
pub struct WorkspaceDetector;

impl WorkspaceDetector {
    /// Detect the workspace declared at the root of the tree.
    ///
    /// `manifests` are all parsed manifests (every depth); member metadata is
    /// taken from them.
    pub fn detect(tree: &ProjectTree, manifests: &[ManifestSignal]) -> WorkspaceInfo {
        let Some(decl) = Self::declaration(tree) else {
            return WorkspaceInfo::single_project();
        };

        let members = resolve_members(tree, manifests, &decl);
        tracing::debug!(
            workspace_type = decl.workspace_type.as_str(),
            patterns = decl.patterns.len(),
            members = members.len(),
            "detected workspace"
        );

        WorkspaceInfo {
            workspace_type: decl.workspace_type,
            manifest_path: Some(decl.manifest_path.to_string()),
            name: decl.name,
            members,
        }
    }

    fn declaration(tree: &ProjectTree) -> Option<Declaration> {
        // Check for Cargo workspace
        if let Some(content) = tree.content("Cargo.toml") {
            match super::cargo::parse_cargo_workspace(content) {
                Ok(Some(ws)) => {
                    return Some(Declaration {
                        workspace_type: WorkspaceType::CargoWorkspace,
                        manifest_path: "Cargo.toml",
                        name: ws.name,
                        patterns: ws.members,
                        exclude: ws.exclude,
                        member_marker: Some(&["Cargo.toml"]),
                        ecosystems: &[Ecosystem::Cargo],
                    })
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "root Cargo.toml unreadable for workspace detection"),
            }
        }

        // Check for Gradle multi-project
        for settings in ["settings.gradle.kts", "settings.gradle"] {
            if let Some(content) = tree.content(settings) {
                let (name, includes) = gradle::parse_settings(content);
                if !includes.is_empty() {
                    return Some(Declaration {
                        workspace_type: WorkspaceType::GradleMultiProject,
                        manifest_path: settings,
                        name,
                        patterns: includes,
                        exclude: Vec::new(),
                        member_marker: None,
                        ecosystems: &[Ecosystem::Gradle],
                    });
                }
            }
        }

        // Check for NPM workspace
        if let Some(content) = tree.content("package.json") {
            if let Ok(Some((name, patterns))) = super::npm::package_json_workspaces(content) {
                return Some(npm_declaration("package.json", name, patterns));
            }
        }

        // Check for pnpm workspace
        if let Some(content) = tree.content("pnpm-workspace.yaml") {
            match super::npm::pnpm_workspace_patterns(content) {
                Ok(patterns) => {
                    let name = tree
                        .content("package.json")
                        .and_then(|c| serde_json::from_str::<serde_json::Value>(c).ok())
                        .and_then(|json| json.get("name").and_then(|v| v.as_str()).map(String::from));
                    return Some(npm_declaration("pnpm-workspace.yaml", name, patterns));
                }
                Err(e) => tracing::debug!(error = %e, "pnpm-workspace.yaml unreadable"),
            }
        }

        // Check for Maven multi-module
        if let Some(content) = tree.content("pom.xml") {
            if let Ok(modules) = maven::pom_modules(content) {
                if !modules.is_empty() {
                    return Some(Declaration {
                        workspace_type: WorkspaceType::MavenMultiModule,
                        manifest_path: "pom.xml",
                        name: None,
                        patterns: modules,
                        exclude: Vec::new(),
                        member_marker: None,
                        ecosystems: &[Ecosystem::Maven],
                    });
                }
            }
        }

        None
    }
}

fn npm_declaration(manifest_path: &'static str, name: Option<String>, patterns: Vec<String>) -> Declaration {
    let (exclude, patterns): (Vec<String>, Vec<String>) = patterns
        .into_iter()
        .partition(|p| p.starts_with('!'));
    Declaration {
        workspace_type: WorkspaceType::NpmWorkspace,
        manifest_path,
        name,
        patterns,
        exclude: exclude
            .into_iter()
            .map(|p| p.trim_start_matches('!').to_string())
            .collect(),
        member_marker: Some(&["package.json"]),
        ecosystems: &[Ecosystem::Npm],
    }
}

fn resolve_members(tree: &ProjectTree, manifests: &[ManifestSignal], decl: &Declaration) -> Vec<ModuleInfo> {
    let patterns: Vec<String> = decl.patterns.iter().map(|p| normalize(p)).collect();
    let exclude: Vec<String> = decl.exclude.iter().map(|p| normalize(p)).collect();

    let dirs: BTreeSet<&str> = tree
        .dirs
        .iter()
        .map(|d| d.relative_path.as_str())
        .filter(|dir| patterns.iter().any(|p| matches_pattern(dir, p)))
        .filter(|dir| !exclude.iter().any(|p| matches_pattern(dir, p)))
        .filter(|dir| {
            decl.member_marker.map_or(true, |markers| {
                markers.iter().any(|m| tree.has_file(&format!("{}/{}", dir, m)))
            })
        })
        .collect();

    let mut members: Vec<(ModuleInfo, Option<&ManifestSignal>)> = dirs
        .into_iter()
        .map(|dir| {
            let manifest = manifests
                .iter()
                .filter(|m| decl.ecosystems.contains(&m.ecosystem) && m.dir() == dir)
                .min_by(|a, b| a.manifest_path.cmp(&b.manifest_path));
            let fallback = dir.rsplit('/').next().unwrap_or(dir);
            let name = manifest
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| fallback.to_string());

            let mut module = ModuleInfo::new(name, dir);
            module.language = dominant_language(tree, dir);
            module.module_type = manifest.and_then(|m| ModuleType::from_targets(m.library, !m.binaries.is_empty()));
            (module, manifest)
        })
        .collect();

    let names: BTreeSet<String> = members.iter().map(|(m, _)| m.name.clone()).collect();
    for (module, manifest) in &mut members {
        if let Some(manifest) = manifest {
            let internal: BTreeSet<String> = manifest
                .dependency_names()
                .map(|(dep, _)| dep.to_string())
                .filter(|dep| *dep != module.name && names.contains(dep))
                .collect();
            module.internal_dependencies = internal.into_iter().collect();
        }
    }

    members.into_iter().map(|(m, _)| m).collect()
}

/// Language with the most source bytes under `dir`.
fn dominant_language(tree: &ProjectTree, dir: &str) -> Option<String> {
    let prefix = format!("{}/", dir);
    let mut bytes: BTreeMap<&str, u64> = BTreeMap::new();
    for file in tree.files.iter().filter(|f| f.relative_path.starts_with(&prefix)) {
        if let Some(language) = source_language(file, tree.content(&file.relative_path)) {
            if language != UNKNOWN {
                *bytes.entry(language).or_insert(0) += file.size_bytes;
            }
        }
    }
    bytes
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(language, _)| language.to_string())
}

fn normalize(pattern: &str) -> String {
    pattern
        .trim()
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

/// Matches a relative directory against a workspace glob (`*` within a
/// segment, `**` across segments).
fn matches_pattern(dir: &str, pattern: &str) -> bool {
    let pat: Vec<&str> = pattern.split('/').collect();
    let segs: Vec<&str> = dir.split('/').collect();
    match_segments(&pat, &segs)
}

fn match_segments(pat: &[&str], segs: &[&str]) -> bool {
    match pat.split_first() {
        None => segs.is_empty(),
        Some((&"**", rest)) => (0..=segs.len()).any(|i| match_segments(rest, &segs[i..])),
        Some((p, rest)) => segs
            .split_first()
            .is_some_and(|(s, tail)| wildcard(p, s) && match_segments(rest, tail)),
    }
}

/// `*` matches any run of characters within one segment.
fn wildcard(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut last_star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && pat[p] == '*' {
            last_star = Some((p, t));
            p += 1;
        } else if p < pat.len() && pat[p] == txt[t] {
            p += 1;
            t += 1;
        } else if let Some((star, consumed)) = last_star {
            p = star + 1;
            t = consumed + 1;
            last_star = Some((star, consumed + 1));
        } else {
            return false;
        }
    }
    pat[p..].iter().all(|&c| c == '*')
}
