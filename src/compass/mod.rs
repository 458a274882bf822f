//! Project Compass: resolves raw signals into one coherent profile.
//!
//! Provides:
//! - Primary/secondary language selection with deterministic tie-breaks
//! - Per-ecosystem manifest selection and framework/build deduplication
//! - Project type classification
//! - Entry point and important file detection

pub mod entry_detector;
pub mod profile_builder;
pub mod project_type;

pub use entry_detector::{detect_entry_points, detect_important_files, file_type_histogram};
pub use profile_builder::{LanguageStats, LanguageSummary, ProfileBuilder, ProjectProfile};
pub use project_type::ProjectType;
