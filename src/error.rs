use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure kinds surfaced to callers of `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    BudgetExceeded,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::BudgetExceeded => "budget_exceeded",
            ErrorKind::Timeout => "timeout",
        }
    }
}

/// Fatal analysis error. Everything else degrades into result notes.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Path not found: {} ({reason})", .path.display())]
    NotFound { path: PathBuf, reason: String },

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::NotFound { .. } => ErrorKind::NotFound,
            AnalysisError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AnalysisError::BudgetExceeded(_) => ErrorKind::BudgetExceeded,
            AnalysisError::Timeout(_) | AnalysisError::Cancelled => ErrorKind::Timeout,
        }
    }

    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                AnalysisError::PermissionDenied(path.to_path_buf())
            }
            _ => AnalysisError::NotFound {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Per-manifest parse failure. Converted into a degraded note by the caller.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Invalid(String),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("no insight provider configured")]
    NotConfigured,

    #[error("insight request failed: {0}")]
    Http(String),

    #[error("insight request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid insight response: {0}")]
    InvalidResponse(String),
}
