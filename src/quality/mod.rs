//! Quality assessor: fixed rubric over the resolved profile and the tree.

use serde::{Deserialize, Serialize};

use crate::compass::ProjectProfile;
use crate::config::{AnalysisOptions, QualityWeights};
use crate::languages::{LanguageKind, REGISTRY};
use crate::signals::language::source_language;
use crate::tree::{FileNode, ProjectTree};

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "specs", "testing", "e2e"];

/// File-name suffixes of test files: Go, Python, JS/TS, JVM, Ruby, .NET, Dart.
const TEST_SUFFIXES: &[&str] = &[
    "_test.go",
    "_test.py",
    ".test.js",
    ".test.jsx",
    ".test.ts",
    ".test.tsx",
    ".spec.js",
    ".spec.jsx",
    ".spec.ts",
    ".spec.tsx",
    "Test.java",
    "Tests.java",
    "Test.kt",
    "Tests.kt",
    "_spec.rb",
    "_test.rb",
    "Tests.cs",
    "Test.cs",
    "Test.php",
    "_test.dart",
    "_test.exs",
];

const DOC_DIRS: &[&str] = &["docs", "doc", "documentation"];

const CI_FILES: &[&str] = &[
    ".gitlab-ci.yml",
    ".travis.yml",
    "Jenkinsfile",
    "azure-pipelines.yml",
    "bitbucket-pipelines.yml",
    ".drone.yml",
    "appveyor.yml",
    "cloudbuild.yaml",
];

/// Directories whose contents are CI configuration.
const CI_DIRS: &[&str] = &[".github/workflows", ".circleci", ".buildkite"];

const LINT_FILES: &[&str] = &[
    "eslint.config.js",
    "eslint.config.mjs",
    "eslint.config.cjs",
    "eslint.config.ts",
    "biome.json",
    "tslint.json",
    ".flake8",
    "ruff.toml",
    ".ruff.toml",
    ".pylintrc",
    "pylintrc",
    ".rubocop.yml",
    "clippy.toml",
    ".clippy.toml",
    "rustfmt.toml",
    ".rustfmt.toml",
    ".golangci.yml",
    ".golangci.yaml",
    "checkstyle.xml",
    "detekt.yml",
    ".swiftlint.yml",
    "analysis_options.yaml",
    "phpcs.xml",
    "phpstan.neon",
    ".scalafmt.conf",
];

/// Prefixes covering every variant (`.eslintrc.json`, `.prettierrc.yaml`, ...).
const LINT_PREFIXES: &[&str] = &[".eslintrc", ".prettierrc", ".stylelintrc"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    pub has_tests: bool,
    pub has_documentation: bool,
    #[serde(rename = "hasCI")]
    pub has_ci: bool,
    pub has_linting: bool,
    pub test_file_count: usize,
    pub doc_file_count: usize,
    /// 0 to 10, one decimal
    pub quality_score: f64,
    pub recommendations: Vec<String>,
}

/// One rubric row: whether it applies, whether it passed, its weight and the
/// recommendation when it fails.
struct RubricItem {
    applies: bool,
    passed: bool,
    weight: f64,
    recommendation: &'static str,
}

pub fn assess(profile: &ProjectProfile, tree: &ProjectTree, options: &AnalysisOptions) -> QualityAssessment {
    let test_file_count = tree.files.iter().filter(|f| is_test_file(f)).count();
    let doc_file_count = tree.files.iter().filter(|f| is_doc_file(f)).count();
    let has_tests = test_file_count > 0;
    let has_documentation = tree.files.iter().any(is_readme)
        || tree.files.iter().any(|f| f.dir_components().any(|c| DOC_DIRS.contains(&c)));
    let has_ci = tree.files.iter().any(is_ci_file);
    let has_linting = tree.files.iter().any(|f| is_lint_config(f.file_name()));

    let total_dependencies = profile.total_dependencies();
    let weights = &options.quality_weights;
    let items = rubric(
        weights,
        [
            (true, has_tests),
            (true, has_documentation),
            (true, has_ci),
            (true, has_linting),
            (!tree.is_empty(), !tree.files.iter().any(|f| f.oversized)),
            (
                !profile.manifests.is_empty(),
                total_dependencies <= options.max_reasonable_dependencies,
            ),
        ],
    );

    let mut score = weights.base;
    let mut recommendations = Vec::new();
    for item in &items {
        if !item.applies {
            continue;
        }
        if item.passed {
            score += item.weight;
        } else {
            recommendations.push(item.recommendation.to_string());
        }
    }

    let quality_score = (score.clamp(0.0, 10.0) * 10.0).round() / 10.0;
    tracing::debug!(quality_score, has_tests, has_documentation, has_ci, has_linting, "assessed quality");

    QualityAssessment {
        has_tests,
        has_documentation,
        has_ci,
        has_linting,
        test_file_count,
        doc_file_count,
        quality_score,
        recommendations,
    }
}

/// Rubric in evaluation order; the order is also the recommendation order.
fn rubric(weights: &QualityWeights, results: [(bool, bool); 6]) -> [RubricItem; 6] {
    let [tests, docs, ci, lint, oversized, deps] = results;
    let item = |(applies, passed): (bool, bool), weight: f64, recommendation: &'static str| RubricItem {
        applies,
        passed,
        weight,
        recommendation,
    };
    [
        item(tests, weights.tests, "Add automated tests to protect behavior during changes"),
        item(docs, weights.documentation, "Add a README describing setup, usage and architecture"),
        item(ci, weights.ci, "Set up continuous integration to build and test every change"),
        item(lint, weights.linting, "Configure a linter or formatter to keep the code style consistent"),
        item(
            oversized,
            weights.no_oversized_files,
            "Split or move out very large files; they are hard to review and were not analyzed",
        ),
        item(
            deps,
            weights.reasonable_dependencies,
            "Review the dependency list; a large number of direct dependencies raises maintenance cost",
        ),
    ]
}

pub fn is_test_file(file: &FileNode) -> bool {
    let name = file.file_name();
    if TEST_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return true;
    }
    if name.starts_with("test_") && name.ends_with(".py") {
        return true;
    }
    file.dir_components().any(|c| TEST_DIRS.contains(&c)) && source_language(file, None).is_some()
}

fn is_readme(file: &FileNode) -> bool {
    file.file_name().to_ascii_lowercase().starts_with("readme")
}

fn is_doc_file(file: &FileNode) -> bool {
    REGISTRY
        .detect(file, None)
        .and_then(|lang| REGISTRY.kind_of(lang))
        == Some(LanguageKind::Prose)
}

pub fn is_ci_file(file: &FileNode) -> bool {
    if CI_FILES.contains(&file.file_name()) {
        return true;
    }
    let dir = file.parent_dir();
    CI_DIRS
        .iter()
        .any(|ci| dir == *ci || dir.starts_with(&format!("{}/", ci)))
}

pub fn is_lint_config(file_name: &str) -> bool {
    LINT_FILES.contains(&file_name) || LINT_PREFIXES.iter().any(|p| file_name.starts_with(p))
}
