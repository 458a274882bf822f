mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use commands::{analyze, list_languages};

#[derive(Parser)]
#[command(name = "project-profiler")]
#[command(about = "Profile an unknown source tree: languages, frameworks, build systems, metrics and run commands")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Profile the current directory as JSON
    project-profiler analyze

    # Human-readable summary of another checkout
    project-profiler analyze ../service --format summary

    # Tighter budgets from a config file, result written to disk
    project-profiler analyze . --config profiler.yaml --output profile.json

    # Ask an OpenAI-compatible endpoint for narrative insights
    OPENAI_API_KEY=... project-profiler analyze . --insight-endpoint https://api.openai.com

    # Show the extension table
    project-profiler languages
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a directory
    Analyze(AnalyzeArgs),

    /// List recognized languages and their extensions
    Languages,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Directory to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Options file (.yaml, .yml or .toml); flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop walking after this many total bytes
    #[arg(long)]
    pub max_total_size: Option<u64>,

    /// Stop walking after this many files
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Do not enter directories deeper than this
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Files larger than this are indexed but not read
    #[arg(long)]
    pub per_file_limit: Option<u64>,

    /// Hard deadline for the whole analysis in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// OpenAI-compatible endpoint for narrative insights
    #[arg(long)]
    pub insight_endpoint: Option<String>,

    /// Model name sent to the insight endpoint
    #[arg(long, default_value = "gpt-4o-mini")]
    pub insight_model: String,

    /// Deadline for the insight call in milliseconds
    #[arg(long)]
    pub insight_timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Summary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::parse_from([
            "project-profiler",
            "analyze",
            "repo",
            "--max-files",
            "10",
            "--format",
            "summary",
            "--insight-endpoint",
            "http://localhost:8080",
        ]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.path, PathBuf::from("repo"));
        assert_eq!(args.max_files, Some(10));
        assert_eq!(args.format, OutputFormat::Summary);
        assert_eq!(args.insight_model, "gpt-4o-mini");
        assert!(args.config.is_none());
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["project-profiler", "analyze"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.path, PathBuf::from("."));
        assert_eq!(args.format, OutputFormat::Json);
    }
}
