//! The assembled analysis result and its notes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compass::{LanguageSummary, ProjectType};
use crate::dependencies::ManifestSignal;
use crate::execution::ExecutionMethod;
use crate::insights::Insights;
use crate::metrics::Metrics;
use crate::quality::QualityAssessment;
use crate::signals::{BuildSystemSignal, FrameworkSignal};
use crate::structure::DirectoryStructure;
use crate::workspace::WorkspaceInfo;

/// How much a note affects the trustworthiness of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSeverity {
    /// Budget or scope information; the result is complete for what it covers
    Info,
    /// An optional stage did not contribute (e.g. no insight provider)
    Warning,
    /// Some input could not be used; the profile may have unknowns
    Degraded,
}

impl NoteSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteSeverity::Info => "info",
            NoteSeverity::Warning => "warning",
            NoteSeverity::Degraded => "degraded",
        }
    }
}

/// A non-fatal observation recorded during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisNote {
    pub severity: NoteSeverity,
    /// Pipeline stage that recorded the note (`walker`, `manifest`, ...)
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AnalysisNote {
    pub fn new(severity: NoteSeverity, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            component: component.into(),
            message: message.into(),
            path: None,
        }
    }

    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoteSeverity::Degraded, component, message)
    }

    pub fn warning(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoteSeverity::Warning, component, message)
    }

    pub fn info(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoteSeverity::Info, component, message)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Sorts notes by component, path, then message and drops exact duplicates.
pub fn sort_notes(notes: &mut Vec<AnalysisNote>) {
    notes.sort_by(|a, b| {
        a.component
            .cmp(&b.component)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.message.cmp(&b.message))
            .then_with(|| a.severity.cmp(&b.severity))
    });
    notes.dedup();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub name: String,
    pub size_bytes: u64,
    pub file_count: usize,
    pub dir_count: usize,
    /// A walk budget ran out; the result covers only what was enumerated
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation_reason: Option<String>,
}

/// Everything one `analyze` call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub timestamp: DateTime<Utc>,
    pub root_path: String,
    pub basic_info: BasicInfo,
    pub is_git_repo: bool,
    pub languages: LanguageSummary,
    pub manifests: Vec<ManifestSignal>,
    pub frameworks: Vec<FrameworkSignal>,
    pub testing_frameworks: Vec<String>,
    pub build_systems: Vec<BuildSystemSignal>,
    pub project_type: ProjectType,
    pub workspace: WorkspaceInfo,
    pub structure: DirectoryStructure,
    pub entry_points: Vec<String>,
    pub important_files: Vec<String>,
    /// Extension to file count; files without one are under `""`
    pub file_types: BTreeMap<String, usize>,
    pub metrics: Metrics,
    pub quality: QualityAssessment,
    pub execution_methods: Vec<ExecutionMethod>,
    pub observations: Vec<String>,
    pub security_findings: Vec<String>,
    pub notes: Vec<AnalysisNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,
}

impl AnalysisResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Whether any stage recorded a degraded note.
    pub fn is_degraded(&self) -> bool {
        self.notes.iter().any(|n| n.severity == NoteSeverity::Degraded)
    }

    /// Plain-text report for terminals.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let info = &self.basic_info;

        let _ = writeln!(out, "Project: {} ({})", info.name, self.root_path);
        let _ = writeln!(out, "Type: {}", self.project_type.as_str());
        let _ = write!(
            out,
            "Files: {} in {} directories, {} bytes",
            info.file_count, info.dir_count, info.size_bytes
        );
        if info.truncated {
            let _ = write!(
                out,
                " (truncated: {})",
                info.truncation_reason.as_deref().unwrap_or("budget")
            );
        }
        out.push('\n');
        if self.workspace.is_workspace() {
            let _ = writeln!(
                out,
                "Workspace: {} with {} members",
                self.workspace.workspace_type.as_str(),
                self.workspace.members.len()
            );
        }

        let _ = write!(out, "Primary language: {}", self.languages.primary);
        if !self.languages.secondary.is_empty() {
            let _ = write!(out, " (also {})", self.languages.secondary.join(", "));
        }
        out.push('\n');

        if !self.frameworks.is_empty() {
            let list: Vec<String> = self
                .frameworks
                .iter()
                .map(|f| format!("{} [{}]", f.name, f.confidence.as_str()))
                .collect();
            let _ = writeln!(out, "Frameworks: {}", list.join(", "));
        }
        if !self.build_systems.is_empty() {
            let list: Vec<&str> = self.build_systems.iter().map(|b| b.name.as_str()).collect();
            let _ = writeln!(out, "Build systems: {}", list.join(", "));
        }

        let m = &self.metrics;
        let _ = writeln!(
            out,
            "Lines: {} total, {} code, {} comment, {} blank across {} files (complexity {})",
            m.total_lines,
            m.code_lines,
            m.comment_lines,
            m.blank_lines,
            m.files_analyzed,
            m.estimated_complexity.as_str()
        );

        let q = &self.quality;
        let _ = writeln!(
            out,
            "Quality: {:.1}/10 (tests: {}, docs: {}, ci: {}, linting: {})",
            q.quality_score,
            yes_no(q.has_tests),
            yes_no(q.has_documentation),
            yes_no(q.has_ci),
            yes_no(q.has_linting)
        );
        for rec in &q.recommendations {
            let _ = writeln!(out, "  - {}", rec);
        }

        if !self.execution_methods.is_empty() {
            out.push_str("Commands:\n");
            for method in &self.execution_methods {
                let _ = writeln!(
                    out,
                    "  {:<40} {:<8} {}",
                    method.command,
                    method.confidence.as_str(),
                    method.description
                );
            }
        }

        if !self.structure.common_directories.is_empty() {
            let _ = writeln!(out, "Directories: {}", self.structure.common_directories.join(", "));
        }

        for line in &self.observations {
            let _ = writeln!(out, "* {}", line);
        }
        for finding in &self.security_findings {
            let _ = writeln!(out, "! {}", finding);
        }

        if let Some(insights) = &self.insights {
            let _ = writeln!(out, "\nInsights ({}):\n{}", insights.provider, insights.summary);
        }

        if !self.notes.is_empty() {
            out.push_str("Notes:\n");
            for note in &self.notes {
                let _ = write!(
                    out,
                    "  [{}] {}: {}",
                    note.severity.as_str(),
                    note.component,
                    note.message
                );
                if let Some(path) = &note.path {
                    let _ = write!(out, " ({})", path);
                }
                out.push('\n');
            }
        }

        out
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
