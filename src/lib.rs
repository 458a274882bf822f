pub mod analyzer;
pub mod compass;
pub mod config;
pub mod deadline;
pub mod dependencies;
pub mod error;
pub mod execution;
pub mod insights;
pub mod languages;
pub mod metrics;
pub mod observations;
pub mod quality;
pub mod report;
pub mod signals;
pub mod structure;
pub mod tree;
pub mod workspace;

pub use analyzer::{analyze_blocking, profile_directory, Analyzer};
pub use compass::{LanguageStats, LanguageSummary, ProjectProfile, ProjectType};
pub use config::{AnalysisOptions, ComplexityThresholds, QualityWeights};
pub use deadline::Deadline;
pub use dependencies::{Ecosystem, ManifestRegistry, ManifestSignal};
pub use error::{AnalysisError, ErrorKind, ExtractError, InsightError, Result};
pub use execution::{ExecutionMethod, ExecutionType};
pub use insights::{InsightConfig, InsightEnricher, InsightProvider, Insights, OpenAiProvider};
pub use languages::REGISTRY;
pub use metrics::{Complexity, Metrics};
pub use quality::QualityAssessment;
pub use report::{AnalysisNote, AnalysisResult, BasicInfo, NoteSeverity};
pub use signals::{BuildSystemSignal, Confidence, FrameworkCategory, FrameworkSignal};
pub use structure::{DirectoryStructure, NodeType, StructureNode};
pub use tree::{FileNode, ProjectTree};
pub use workspace::{ModuleInfo, ModuleType, WorkspaceInfo, WorkspaceType};
