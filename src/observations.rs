//! Deterministic narrative lines and security findings about the profile.

use crate::compass::ProjectProfile;
use crate::metrics::Metrics;
use crate::quality::QualityAssessment;
use crate::tree::ProjectTree;
use crate::workspace::WorkspaceInfo;

const LARGE_PROJECT_FILES: usize = 1_000;
const MEDIUM_PROJECT_FILES: usize = 100;
const SUBSTANTIAL_CODE_LINES: usize = 100_000;
const MODERATE_CODE_LINES: usize = 10_000;
const HEAVY_DEPENDENCIES: usize = 100;
const MODERATE_DEPENDENCIES: usize = 50;
const WELL_DOCUMENTED_FILES: usize = 5;

pub fn observe(
    tree: &ProjectTree,
    profile: &ProjectProfile,
    workspace: &WorkspaceInfo,
    metrics: &Metrics,
    quality: &QualityAssessment,
) -> Vec<String> {
    let mut lines = Vec::new();

    let files = tree.file_count();
    lines.push(if files > LARGE_PROJECT_FILES {
        format!("Large-scale project with {} files", files)
    } else if files > MEDIUM_PROJECT_FILES {
        format!("Medium-scale project with {} files", files)
    } else {
        format!("Small project with {} files", files)
    });

    if metrics.code_lines > SUBSTANTIAL_CODE_LINES {
        lines.push(format!("Substantial codebase with {} lines of code", metrics.code_lines));
    } else if metrics.code_lines > MODERATE_CODE_LINES {
        lines.push(format!("Moderate codebase with {} lines of code", metrics.code_lines));
    }

    let languages = &profile.languages;
    if !languages.secondary.is_empty() {
        lines.push(format!(
            "Polyglot project: {} plus {}",
            languages.primary,
            languages.secondary.join(", ")
        ));
    }

    if workspace.is_workspace() {
        lines.push(format!(
            "{} with {} members",
            workspace_label(workspace),
            workspace.members.len()
        ));
    }

    if !profile.frameworks.is_empty() {
        let mut names: Vec<&str> = profile.frameworks.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        lines.push(format!("Uses frameworks: {}", names.join(", ")));
    }

    let deps = profile.total_dependencies();
    if deps > HEAVY_DEPENDENCIES {
        lines.push(format!("Heavy dependency usage: {} declared dependencies", deps));
    } else if deps > MODERATE_DEPENDENCIES {
        lines.push(format!("Moderate dependency usage: {} declared dependencies", deps));
    }

    let testing = profile.testing_frameworks();
    if !testing.is_empty() {
        lines.push(format!("Testing frameworks: {}", testing.join(", ")));
    }

    if profile.has_build_system("docker") || profile.has_build_system("docker-compose") {
        lines.push("Containerized application using Docker".to_string());
    }

    if quality.doc_file_count > WELL_DOCUMENTED_FILES {
        lines.push(format!(
            "Well-documented project with {} documentation files",
            quality.doc_file_count
        ));
    }

    lines
}

const ENV_TEMPLATE_SUFFIXES: &[&str] = &[".example", ".sample", ".template", ".dist"];

/// Risk hints derived from the profile. Never a vulnerability scan: only
/// dependency load, container use and committed environment files.
pub fn security_findings(tree: &ProjectTree, profile: &ProjectProfile) -> Vec<String> {
    let mut findings = Vec::new();

    let deps = profile.total_dependencies();
    if deps > HEAVY_DEPENDENCIES {
        findings.push(format!(
            "Large number of dependencies ({}) increases attack surface",
            deps
        ));
    }

    if profile.has_build_system("docker") || profile.has_build_system("docker-compose") {
        findings.push("Ensure Docker images are regularly updated".to_string());
    }

    for file in tree.files.iter().filter(|f| is_env_file(f.file_name())) {
        findings.push(format!(
            "Environment file {} is present; keep secrets out of version control",
            file.relative_path
        ));
    }

    findings
}

fn is_env_file(name: &str) -> bool {
    (name == ".env" || name.starts_with(".env."))
        && !ENV_TEMPLATE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn workspace_label(workspace: &WorkspaceInfo) -> &'static str {
    use crate::workspace::WorkspaceType;
    match workspace.workspace_type {
        WorkspaceType::CargoWorkspace => "Cargo workspace",
        WorkspaceType::NpmWorkspace => "JavaScript monorepo",
        WorkspaceType::GradleMultiProject => "Gradle multi-project build",
        WorkspaceType::MavenMultiModule => "Maven multi-module build",
        WorkspaceType::SingleProject => "Single project",
    }
}
