use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};
use rayon::prelude::*;

use crate::config::AnalysisOptions;
use crate::deadline::Deadline;
use crate::error::{AnalysisError, Result};
use crate::languages::REGISTRY;
use crate::report::AnalysisNote;

use super::{DirNode, FileNode, ProjectTree};

/// Directory names that are never entered: VCS metadata, dependency caches
/// and build output.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "bower_components",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "site-packages",
    "target",
    "dist",
    "build",
    "out",
    "obj",
    ".next",
    ".nuxt",
    ".svelte-kit",
    ".gradle",
    ".idea",
    ".vscode",
    ".vs",
    "coverage",
    ".nyc_output",
    ".cache",
    ".dart_tool",
    "Pods",
    ".terraform",
];

const DEADLINE_CHECK_INTERVAL: usize = 64;
const BINARY_SNIFF_LEN: usize = 8 * 1024;

pub struct TreeWalker {
    max_total_size: u64,
    max_file_count: usize,
    max_depth: usize,
    per_file_read_limit: u64,
    max_read_bytes: u64,
}

impl TreeWalker {
    pub fn new(options: &AnalysisOptions) -> Self {
        Self {
            max_total_size: options.max_total_size_bytes,
            max_file_count: options.max_file_count,
            max_depth: options.max_depth,
            per_file_read_limit: options.per_file_read_limit_bytes,
            max_read_bytes: options.max_read_bytes,
        }
    }

    /// Walks `root` and reads the contents of files the extractors need.
    ///
    /// Budget exhaustion truncates the tree; only an inaccessible root, an
    /// unusable budget or a deadline breach fail the walk.
    pub fn walk(&self, root: &Path, deadline: &Deadline) -> Result<ProjectTree> {
        if self.max_file_count == 0 || self.max_total_size == 0 {
            return Err(AnalysisError::BudgetExceeded(format!(
                "walk budget leaves no room for a single file (max_file_count={}, max_total_size_bytes={})",
                self.max_file_count, self.max_total_size
            )));
        }

        let root = prepare_root(root)?;
        let mut tree = ProjectTree::new(root.clone());
        tree.is_git_repo = root.join(".git").exists();

        self.enumerate(&root, &mut tree, deadline)?;
        deadline.check()?;
        self.read_contents(&root, &mut tree)?;
        deadline.check()?;

        tracing::debug!(
            "Walked {}: {} files, {} dirs, {} read, truncated={}",
            root.display(),
            tree.files.len(),
            tree.dirs.len(),
            tree.content_count(),
            tree.truncated
        );

        Ok(tree)
    }

    fn enumerate(&self, root: &Path, tree: &mut ProjectTree, deadline: &Deadline) -> Result<()> {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .max_depth(Some(self.max_depth))
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry))
            .build();

        for (seen, result) in walker.enumerate() {
            if seen % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check()?;
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    tree.notes
                        .push(AnalysisNote::degraded("walker", format!("unreadable entry: {}", err)));
                    continue;
                }
            };

            if entry.depth() == 0 {
                if self.max_depth == 0 && dir_has_entries(entry.path()) {
                    mark_truncated(tree, "max_depth");
                }
                continue;
            }
            if entry.path_is_symlink() {
                continue;
            }
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let relative_path = relative_path(root, entry.path());

            if file_type.is_dir() {
                if entry.depth() >= self.max_depth && dir_has_entries(entry.path()) {
                    mark_truncated(tree, "max_depth");
                }
                tree.dirs.push(DirNode { relative_path });
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    tracing::warn!("Cannot stat {}: {}", relative_path, err);
                    tree.notes.push(
                        AnalysisNote::degraded("walker", format!("cannot stat file: {}", err))
                            .with_path(relative_path),
                    );
                    continue;
                }
            };
            let size = metadata.len();

            if tree.files.len() >= self.max_file_count {
                mark_truncated(tree, "max_file_count");
                break;
            }
            if tree.total_size.saturating_add(size) > self.max_total_size {
                mark_truncated(tree, "max_total_size");
                break;
            }

            let extension = Path::new(&relative_path)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase());

            tree.total_size += size;
            tree.files.push(FileNode {
                relative_path,
                size_bytes: size,
                extension,
                modified_at: metadata.modified().ok().map(Into::into),
                oversized: size > self.per_file_read_limit,
            });
        }

        Ok(())
    }

    /// Reads manifests and config files first, then sources, until the
    /// total read budget is spent.
    fn read_contents(&self, root: &Path, tree: &mut ProjectTree) -> Result<()> {
        let mut candidates: Vec<(usize, &FileNode)> = tree
            .files
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.oversized && REGISTRY.should_read(f.file_name(), f.extension()))
            .collect();
        candidates.sort_by_key(|(idx, f)| (!REGISTRY.is_config_file(f.file_name()), *idx));

        let mut budget = self.max_read_bytes;
        let mut selected = Vec::with_capacity(candidates.len());
        let mut skipped = 0usize;
        for (_, file) in candidates {
            if file.size_bytes <= budget {
                budget -= file.size_bytes;
                selected.push(file.relative_path.clone());
            } else {
                skipped += 1;
            }
        }

        let limit = self.per_file_read_limit;
        let reads: Vec<(String, std::io::Result<Option<String>>)> = selected
            .into_par_iter()
            .map(|path| {
                let content = read_text(&root.join(&path), limit);
                (path, content)
            })
            .collect();

        for (path, read) in reads {
            match read {
                Ok(Some(content)) => tree.insert_content(path, content),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!("Cannot read {}: {}", path, err);
                    tree.notes.push(
                        AnalysisNote::degraded("walker", format!("cannot read file: {}", err))
                            .with_path(path),
                    );
                }
            }
        }

        if skipped > 0 {
            tree.notes.push(AnalysisNote::info(
                "walker",
                format!("content read budget exhausted; {} files indexed without content", skipped),
            ));
        }

        Ok(())
    }
}

fn prepare_root(root: &Path) -> Result<PathBuf> {
    let canonical = root
        .canonicalize()
        .map_err(|e| AnalysisError::from_io(root, e))?;
    let metadata = fs::metadata(&canonical).map_err(|e| AnalysisError::from_io(root, e))?;
    if !metadata.is_dir() {
        return Err(AnalysisError::NotFound {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    fs::read_dir(&canonical).map_err(|e| AnalysisError::from_io(root, e))?;
    Ok(canonical)
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().map_or(false, |ft| ft.is_dir())
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| IGNORED_DIRS.contains(&name))
}

fn dir_has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn mark_truncated(tree: &mut ProjectTree, reason: &str) {
    if !tree.truncated {
        tracing::info!("Tree truncated: {} budget reached", reason);
    }
    tree.truncated = true;
    if tree.truncation_reason.is_none() {
        tree.truncation_reason = Some(reason.to_string());
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads up to `limit` bytes; `None` when the file looks binary.
fn read_text(path: &Path, limit: u64) -> std::io::Result<Option<String>> {
    let file = fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes)?;

    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
