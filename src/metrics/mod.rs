//! Metrics engine: line classification per source file.
//!
//! Each line of a programming or markup file is blank, comment or code,
//! decided with the language's comment syntax. Counting stops at the line
//! budget; files are taken in walk order so the cut is deterministic.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ComplexityThresholds;
use crate::languages::{CommentSyntax, REGISTRY, UNKNOWN};
use crate::signals::language::source_language;
use crate::tree::ProjectTree;

/// Size proxy bucketed from average code lines per file. Not a measure of
/// control-flow or structural complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }

    pub fn from_average(average_code_lines: f64, thresholds: &ComplexityThresholds) -> Self {
        if average_code_lines < thresholds.low_below {
            Complexity::Low
        } else if average_code_lines < thresholds.medium_below {
            Complexity::Medium
        } else {
            Complexity::High
        }
    }
}

impl Default for Complexity {
    fn default() -> Self {
        Complexity::Low
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCounts {
    pub total: usize,
    pub code: usize,
    pub comment: usize,
    pub blank: usize,
}

impl LineCounts {
    fn add(&mut self, other: &LineCounts) {
        self.total += other.total;
        self.code += other.code;
        self.comment += other.comment;
        self.blank += other.blank;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargestFile {
    pub path: String,
    pub lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub files_analyzed: usize,
    /// Average code lines per analyzed file, one decimal
    pub average_code_lines_per_file: f64,
    pub estimated_complexity: Complexity,
    pub by_language: BTreeMap<String, LineCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest_file: Option<LargestFile>,
    /// The line budget stopped counting before every source file was seen
    pub lines_budget_exhausted: bool,
}

/// Computes line metrics over every readable source file in the tree.
pub fn compute(tree: &ProjectTree, max_lines: usize, thresholds: &ComplexityThresholds) -> Metrics {
    let sources: Vec<(&str, &'static str, &str)> = tree
        .readable_files()
        .filter_map(|(file, content)| {
            let language = source_language(file, Some(content))?;
            (language != UNKNOWN).then_some((file.relative_path.as_str(), language, content))
        })
        .collect();

    let counted: Vec<(&str, &'static str, LineCounts)> = sources
        .par_iter()
        .map(|(path, language, content)| {
            let syntax = REGISTRY
                .get(language)
                .map(|def| def.comments)
                .unwrap_or(NO_COMMENTS);
            (*path, *language, count_lines(content, &syntax))
        })
        .collect();

    let mut metrics = Metrics::default();
    let mut totals = LineCounts::default();

    for (path, language, counts) in counted {
        if totals.total + counts.total > max_lines {
            metrics.lines_budget_exhausted = true;
            tracing::debug!(path, max_lines, "line budget exhausted");
            break;
        }
        totals.add(&counts);
        metrics.files_analyzed += 1;
        metrics
            .by_language
            .entry(language.to_string())
            .or_default()
            .add(&counts);

        let larger = metrics
            .largest_file
            .as_ref()
            .map_or(true, |largest| counts.total > largest.lines);
        if larger {
            metrics.largest_file = Some(LargestFile {
                path: path.to_string(),
                lines: counts.total,
            });
        }
    }

    metrics.total_lines = totals.total;
    metrics.code_lines = totals.code;
    metrics.comment_lines = totals.comment;
    metrics.blank_lines = totals.blank;

    let average = if metrics.files_analyzed > 0 {
        metrics.code_lines as f64 / metrics.files_analyzed as f64
    } else {
        0.0
    };
    metrics.average_code_lines_per_file = (average * 10.0).round() / 10.0;
    metrics.estimated_complexity = Complexity::from_average(average, thresholds);
    metrics
}

const NO_COMMENTS: CommentSyntax = CommentSyntax { line: &[], block: &[] };

/// Classifies every line of one file.
///
/// A line that opens a block comment counts as a comment when the marker
/// starts the line and as code otherwise; lines inside the block are
/// comments until the closing marker.
pub fn count_lines(content: &str, syntax: &CommentSyntax) -> LineCounts {
    let mut counts = LineCounts::default();
    let mut open_block: Option<&str> = None;

    for line in content.lines() {
        counts.total += 1;
        let trimmed = line.trim();

        if let Some(end) = open_block {
            counts.comment += 1;
            if trimmed.contains(end) {
                open_block = None;
            }
            continue;
        }

        if trimmed.is_empty() {
            counts.blank += 1;
            continue;
        }

        // block markers first: Lua's `--[[` also starts with `--`
        if let Some((start, end)) = syntax.block.iter().find(|(start, _)| trimmed.starts_with(start)) {
            counts.comment += 1;
            if !trimmed[start.len()..].contains(end) {
                open_block = Some(end);
            }
            continue;
        }

        if syntax.line.iter().any(|marker| trimmed.starts_with(marker)) {
            counts.comment += 1;
            continue;
        }

        counts.code += 1;
        open_block = trailing_open_block(trimmed, syntax);
    }

    counts
}

/// Block comment left open at the end of a code line.
fn trailing_open_block(line: &str, syntax: &CommentSyntax) -> Option<&'static str> {
    let (pos, start, end) = syntax
        .block
        .iter()
        .filter_map(|(start, end)| line.find(start).map(|pos| (pos, *start, *end)))
        .min_by_key(|(pos, _, _)| *pos)?;

    let after = &line[pos + start.len()..];
    (!after.contains(end)).then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::FileNode;
    use std::path::PathBuf;

    const C: CommentSyntax = CommentSyntax {
        line: &["//"],
        block: &[("/*", "*/")],
    };
    const PY: CommentSyntax = CommentSyntax {
        line: &["#"],
        block: &[("\"\"\"", "\"\"\"")],
    };

    fn add(tree: &mut ProjectTree, path: &str, content: &str) {
        tree.files.push(FileNode {
            relative_path: path.to_string(),
            size_bytes: content.len() as u64,
            extension: path.rsplit_once('.').map(|(_, e)| e.to_lowercase()),
            modified_at: None,
            oversized: false,
        });
        tree.insert_content(path.to_string(), content.to_string());
    }

    #[test]
    fn test_count_c_style() {
        let content = "// header\n\nint main() {\n  /* start\n   still comment\n  end */\n  return 0; /* inline */\n}\n";
        let counts = count_lines(content, &C);
        assert_eq!(counts.total, 8);
        assert_eq!(counts.blank, 1);
        assert_eq!(counts.comment, 4);
        assert_eq!(counts.code, 3);
    }

    #[test]
    fn test_trailing_block_opens_comment() {
        let content = "x = 1; /* begins\nstill\n*/\ny = 2;\n";
        let counts = count_lines(content, &C);
        assert_eq!(counts.code, 2);
        assert_eq!(counts.comment, 2);
    }

    #[test]
    fn test_python_docstring() {
        let content = "\"\"\"Module doc.\"\"\"\nimport os\n\"\"\"\nmulti\n\"\"\"\n# note\nprint(os.name)\n";
        let counts = count_lines(content, &PY);
        assert_eq!(counts.comment, 5);
        assert_eq!(counts.code, 2);
    }

    #[test]
    fn test_compute_skips_data_files_and_tracks_largest() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        add(&mut tree, "src/a.rs", "fn a() {}\n\n// c\n");
        add(&mut tree, "src/b.rs", "fn b() {}\nfn c() {}\nfn d() {}\nfn e() {}\n");
        add(&mut tree, "data.json", "{\n\"a\": 1\n}\n");
        add(&mut tree, "README.md", "# doc\n");

        let metrics = compute(&tree, 1_000, &ComplexityThresholds::default());
        assert_eq!(metrics.files_analyzed, 2);
        assert_eq!(metrics.total_lines, 7);
        assert_eq!(metrics.code_lines, 5);
        assert_eq!(metrics.comment_lines, 1);
        assert_eq!(metrics.blank_lines, 1);
        assert_eq!(metrics.by_language["rust"].total, 7);
        assert_eq!(metrics.largest_file.as_ref().unwrap().path, "src/b.rs");
        assert_eq!(metrics.estimated_complexity, Complexity::Low);
        assert!(!metrics.lines_budget_exhausted);
    }

    #[test]
    fn test_line_budget() {
        let mut tree = ProjectTree::new(PathBuf::from("/p"));
        add(&mut tree, "a.py", "x = 1\ny = 2\n");
        add(&mut tree, "b.py", "z = 3\nw = 4\n");

        let metrics = compute(&tree, 3, &ComplexityThresholds::default());
        assert_eq!(metrics.files_analyzed, 1);
        assert_eq!(metrics.total_lines, 2);
        assert!(metrics.lines_budget_exhausted);
    }

    #[test]
    fn test_empty_tree() {
        let tree = ProjectTree::new(PathBuf::from("/p"));
        let metrics = compute(&tree, 1_000, &ComplexityThresholds::default());
        assert_eq!(metrics.files_analyzed, 0);
        assert_eq!(metrics.estimated_complexity, Complexity::Low);
    }

    #[test]
    fn test_complexity_buckets() {
        let t = ComplexityThresholds::default();
        assert_eq!(Complexity::from_average(10.0, &t), Complexity::Low);
        assert_eq!(Complexity::from_average(150.0, &t), Complexity::Medium);
        assert_eq!(Complexity::from_average(400.0, &t), Complexity::High);
    }
}
