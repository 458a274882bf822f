//! Analysis options and scoring constants.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides. Files are YAML (`.yaml`, `.yml`) or TOML (`.toml`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

const MIB: u64 = 1024 * 1024;

/// Budgets and tunables for a single analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Stop walking once enumerated file sizes would exceed this total
    pub max_total_size_bytes: u64,
    /// Stop walking after this many files
    pub max_file_count: usize,
    /// Directories deeper than this are not entered
    pub max_depth: usize,
    /// Files above this size are indexed but never read
    pub per_file_read_limit_bytes: u64,
    /// Total bytes of file content held in memory
    pub max_read_bytes: u64,
    /// Line budget for the metrics pass
    pub max_metric_lines: usize,
    /// Hard deadline for the whole analysis
    pub timeout_ms: u64,
    /// Deadline for the optional insight call
    pub insight_timeout_ms: u64,
    /// Dependency count above which the rubric item fails
    pub max_reasonable_dependencies: usize,
    pub quality_weights: QualityWeights,
    pub complexity_thresholds: ComplexityThresholds,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_total_size_bytes: 200 * MIB,
            max_file_count: 5_000,
            max_depth: 12,
            per_file_read_limit_bytes: MIB,
            max_read_bytes: 64 * MIB,
            max_metric_lines: 1_000_000,
            timeout_ms: 60_000,
            insight_timeout_ms: 30_000,
            max_reasonable_dependencies: 100,
            quality_weights: QualityWeights::default(),
            complexity_thresholds: ComplexityThresholds::default(),
        }
    }
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a YAML or TOML file.
    pub fn from_file(path: &Path) -> ExtractResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
            "toml" => Ok(toml::from_str(&content)?),
            other => Err(ExtractError::Invalid(format!(
                "unsupported config format '{}' (expected .yaml, .yml or .toml)",
                other
            ))),
        }
    }

    pub fn with_max_total_size(mut self, bytes: u64) -> Self {
        self.max_total_size_bytes = bytes;
        self
    }

    pub fn with_max_file_count(mut self, count: usize) -> Self {
        self.max_file_count = count;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_per_file_read_limit(mut self, bytes: u64) -> Self {
        self.per_file_read_limit_bytes = bytes;
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn with_insight_timeout_ms(mut self, ms: u64) -> Self {
        self.insight_timeout_ms = ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn insight_timeout(&self) -> Duration {
        Duration::from_millis(self.insight_timeout_ms)
    }
}

/// Increments applied by the quality rubric.
///
/// These are heuristic constants without a derivation; they are exposed so
/// callers can retune them instead of relying on the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub base: f64,
    pub tests: f64,
    pub documentation: f64,
    pub ci: f64,
    pub linting: f64,
    pub no_oversized_files: f64,
    pub reasonable_dependencies: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            base: 2.0,
            tests: 2.5,
            documentation: 1.5,
            ci: 1.5,
            linting: 0.5,
            no_oversized_files: 1.0,
            reasonable_dependencies: 1.0,
        }
    }
}

/// Buckets for the average code lines per analyzed file.
///
/// This is a size proxy, not a complexity measurement: a project of many
/// long files lands in `high` regardless of how tangled the code is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityThresholds {
    /// Averages below this are `low`
    pub low_below: f64,
    /// Averages below this (and not low) are `medium`, the rest `high`
    pub medium_below: f64,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            low_below: 150.0,
            medium_below: 400.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let opts = AnalysisOptions::default();
        assert_eq!(opts.max_file_count, 5_000);
        assert_eq!(opts.per_file_read_limit_bytes, MIB);
        assert_eq!(opts.timeout(), Duration::from_secs(60));
        assert_eq!(opts.quality_weights.base, 2.0);
    }

    #[test]
    fn test_builders() {
        let opts = AnalysisOptions::new()
            .with_max_file_count(10)
            .with_max_depth(3)
            .with_timeout_ms(500);
        assert_eq!(opts.max_file_count, 10);
        assert_eq!(opts.max_depth, 3);
        assert_eq!(opts.timeout_ms, 500);
    }

    #[test]
    fn test_from_yaml_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiler.yaml");
        fs::write(&path, "max_file_count: 42\nquality_weights:\n  tests: 3.0\n").unwrap();

        let opts = AnalysisOptions::from_file(&path).unwrap();
        assert_eq!(opts.max_file_count, 42);
        assert_eq!(opts.quality_weights.tests, 3.0);
        assert_eq!(opts.quality_weights.base, 2.0);
        assert_eq!(opts.max_depth, 12);
    }

    #[test]
    fn test_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiler.toml");
        fs::write(&path, "max_depth = 4\n\n[complexity_thresholds]\nlow_below = 50.0\n").unwrap();

        let opts = AnalysisOptions::from_file(&path).unwrap();
        assert_eq!(opts.max_depth, 4);
        assert_eq!(opts.complexity_thresholds.low_below, 50.0);
        assert_eq!(opts.complexity_thresholds.medium_below, 400.0);
    }

    #[test]
    fn test_from_file_rejects_unknown_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiler.ini");
        fs::write(&path, "max_depth=4").unwrap();
        assert!(AnalysisOptions::from_file(&path).is_err());
    }
}
