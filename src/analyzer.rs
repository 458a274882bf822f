//! Pipeline entry point.
//!
//! The walk and everything computed from the tree run on a blocking thread;
//! only the optional insight call runs on the async runtime.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::compass::{detect_entry_points, detect_important_files, file_type_histogram, ProfileBuilder};
use crate::config::AnalysisOptions;
use crate::deadline::Deadline;
use crate::dependencies::ManifestRegistry;
use crate::error::{AnalysisError, Result};
use crate::insights::{InsightEnricher, InsightProvider};
use crate::report::{sort_notes, AnalysisNote, AnalysisResult, BasicInfo};
use crate::tree::{ProjectTree, TreeWalker};
use crate::workspace::WorkspaceDetector;
use crate::{execution, metrics, observations, quality, signals, structure};

pub struct Analyzer {
    options: AnalysisOptions,
    insight_provider: Option<Arc<dyn InsightProvider>>,
    token: CancellationToken,
}

impl Analyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            insight_provider: None,
            token: CancellationToken::new(),
        }
    }

    pub fn with_insight_provider(mut self, provider: Arc<dyn InsightProvider>) -> Self {
        self.insight_provider = Some(provider);
        self
    }

    /// Cancelling the token aborts the walk and any pending insight call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Profiles the directory at `root`.
    ///
    /// Fails only when the root is unusable or the deadline passes before
    /// the profile exists; every other problem becomes a note on the result.
    pub async fn analyze(&self, root: impl AsRef<Path>) -> Result<AnalysisResult> {
        let root = root.as_ref().to_path_buf();
        let deadline = Deadline::with_token(self.options.timeout(), self.token.clone());
        tracing::info!("Analyzing {}", root.display());

        let core = {
            let options = self.options.clone();
            let deadline = deadline.clone();
            tokio::task::spawn_blocking(move || profile_directory(&root, &options, &deadline))
        };
        let mut result = match core.await {
            Ok(result) => result?,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => return Err(AnalysisError::Cancelled),
        };

        let insight_timeout = self.options.insight_timeout().min(deadline.remaining());
        InsightEnricher::new(self.insight_provider.clone(), insight_timeout)
            .enrich(&mut result, deadline.token())
            .await;

        sort_notes(&mut result.notes);
        tracing::info!(
            files = result.basic_info.file_count,
            primary = %result.languages.primary,
            notes = result.notes.len(),
            "Analysis finished"
        );
        Ok(result)
    }
}

/// Runs every synchronous stage over `root`, without insights.
pub fn profile_directory(root: &Path, options: &AnalysisOptions, deadline: &Deadline) -> Result<AnalysisResult> {
    let tree = TreeWalker::new(options).walk(root, deadline)?;
    assemble(tree, options, deadline)
}

/// Builds the result from a walked tree.
///
/// Past this point a profile exists, so an expired deadline only adds a
/// degraded note; cancellation still aborts.
fn assemble(tree: ProjectTree, options: &AnalysisOptions, deadline: &Deadline) -> Result<AnalysisResult> {
    let mut late: Option<&'static str> = None;
    let mut checkpoint = |stage: &'static str| -> Result<()> {
        match deadline.check() {
            Err(AnalysisError::Timeout(_)) => {
                late.get_or_insert(stage);
                Ok(())
            }
            other => other,
        }
    };

    checkpoint("walk")?;
    let registry = ManifestRegistry::with_defaults();
    let signals = signals::extract_all(&tree, &registry);
    checkpoint("signals")?;

    let profile = ProfileBuilder::new(&registry).build(&signals, &tree);
    let workspace = WorkspaceDetector::detect(&tree, &signals.manifests);
    tracing::debug!(workspace = workspace.workspace_type.as_str(), "resolved profile");

    let metrics = metrics::compute(&tree, options.max_metric_lines, &options.complexity_thresholds);
    let quality = quality::assess(&profile, &tree, options);
    let execution_methods = execution::infer(&profile, &tree);
    checkpoint("metrics")?;

    let observations = observations::observe(&tree, &profile, &workspace, &metrics, &quality);
    let security_findings = observations::security_findings(&tree, &profile);
    let structure = structure::summarize(&tree);

    let mut notes = tree.notes.clone();
    notes.extend(signals.notes.iter().cloned());
    if let Some(reason) = tree.truncation_reason.as_deref().filter(|_| tree.truncated) {
        notes.push(AnalysisNote::info("walker", format!("walk truncated: {}", reason)));
    }
    if metrics.lines_budget_exhausted {
        notes.push(AnalysisNote::info(
            "metrics",
            format!("line budget of {} reached; remaining files were not counted", options.max_metric_lines),
        ));
    }
    if let Some(stage) = late {
        tracing::warn!(stage, limit = ?deadline.limit(), "deadline passed after the walk");
        notes.push(AnalysisNote::degraded(
            "analyzer",
            format!(
                "deadline of {:?} passed after the {} stage; the profile is complete but late",
                deadline.limit(),
                stage
            ),
        ));
    }
    sort_notes(&mut notes);

    Ok(AnalysisResult {
        timestamp: chrono::Utc::now(),
        root_path: tree.root.display().to_string(),
        basic_info: basic_info(&tree),
        is_git_repo: tree.is_git_repo,
        testing_frameworks: profile.testing_frameworks(),
        entry_points: detect_entry_points(&tree),
        important_files: detect_important_files(&tree, &registry),
        file_types: file_type_histogram(&tree),
        languages: profile.languages,
        manifests: profile.manifests,
        frameworks: profile.frameworks,
        build_systems: profile.build_systems,
        project_type: profile.project_type,
        workspace,
        structure,
        metrics,
        quality,
        execution_methods,
        observations,
        security_findings,
        notes,
        insights: None,
    })
}

fn basic_info(tree: &ProjectTree) -> BasicInfo {
    BasicInfo {
        name: project_name(&tree.root),
        size_bytes: tree.total_size,
        file_count: tree.file_count(),
        dir_count: tree.dir_count(),
        truncated: tree.truncated,
        truncation_reason: tree.truncation_reason.clone(),
    }
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Convenience wrapper for callers without a runtime of their own.
pub fn analyze_blocking(root: impl AsRef<Path>, options: AnalysisOptions) -> Result<AnalysisResult> {
    let deadline = Deadline::new(options.timeout());
    let mut result = profile_directory(root.as_ref(), &options, &deadline)?;
    result.notes.push(AnalysisNote::warning("insights", "no insight provider configured"));
    sort_notes(&mut result.notes);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let err = Analyzer::new(AnalysisOptions::default())
            .analyze("/definitely/not/here")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = Analyzer::new(AnalysisOptions::default())
            .with_cancellation(token)
            .analyze(dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_zero_budget_is_budget_exceeded() {
        let dir = TempDir::new().unwrap();
        let options = AnalysisOptions::default().with_max_file_count(0);
        let err = Analyzer::new(options).analyze(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BudgetExceeded);
    }

    #[test]
    fn test_blocking_wrapper() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        let result = analyze_blocking(dir.path(), AnalysisOptions::default()).unwrap();
        assert_eq!(result.languages.primary, "go");
        assert_eq!(result.entry_points, vec!["main.go"]);
        assert!(result.insights.is_none());
    }

    #[test]
    fn test_late_deadline_keeps_profile() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        let options = AnalysisOptions::default();
        let tree = TreeWalker::new(&options)
            .walk(dir.path(), &Deadline::new(Duration::from_secs(30)))
            .unwrap();

        let result = assemble(tree, &options, &Deadline::new(Duration::ZERO)).unwrap();

        assert_eq!(result.languages.primary, "go");
        assert!(result.is_degraded());
        let note = result.notes.iter().find(|n| n.component == "analyzer").unwrap();
        assert!(note.message.contains("after the walk stage"));
    }

    #[test]
    fn test_cancel_after_walk_still_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        let options = AnalysisOptions::default();
        let tree = TreeWalker::new(&options)
            .walk(dir.path(), &Deadline::new(Duration::from_secs(30)))
            .unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = assemble(tree, &options, &Deadline::with_token(Duration::from_secs(30), token)).unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
    }

    #[test]
    fn test_structure_and_findings_reported() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1\n").unwrap();

        let result = analyze_blocking(dir.path(), AnalysisOptions::default()).unwrap();

        assert_eq!(result.structure.common_directories, vec!["src"]);
        assert_eq!(result.structure.tree.len(), 1);
        assert_eq!(
            result.security_findings,
            vec!["Environment file .env is present; keep secrets out of version control"]
        );
    }

    #[test]
    fn test_project_name_from_root() {
        assert_eq!(project_name(Path::new("/work/shop-api")), "shop-api");
    }
}
