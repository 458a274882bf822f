use std::fs;
use std::sync::Arc;

use anyhow::Context;

use project_profiler::{AnalysisOptions, Analyzer, InsightConfig, OpenAiProvider, REGISTRY};

use super::{AnalyzeArgs, OutputFormat};

const API_KEY_VARS: &[&str] = &["PROFILER_INSIGHT_API_KEY", "OPENAI_API_KEY"];

pub async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let options = build_options(&args)?;
    let mut analyzer = Analyzer::new(options.clone());

    if let Some(endpoint) = args.insight_endpoint.as_deref() {
        let provider = OpenAiProvider::new(InsightConfig {
            endpoint: endpoint.to_string(),
            model: args.insight_model.clone(),
            api_key: api_key_from_env(),
            timeout: options.insight_timeout(),
        })?;
        analyzer = analyzer.with_insight_provider(Arc::new(provider));
    }

    let result = analyzer
        .analyze(&args.path)
        .await
        .map_err(|e| anyhow::anyhow!("{} [{}]", e, e.kind().as_str()))?;

    let rendered = match args.format {
        OutputFormat::Json => result.to_json()?,
        OutputFormat::Summary => result.summary(),
    };

    match args.output.as_ref() {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote profile of {} to {}", result.basic_info.name, path.display());
        }
        None => println!("{}", rendered),
    }

    if result.is_degraded() {
        tracing::warn!("analysis completed with degraded notes; some signals are unknown");
    }
    Ok(())
}

/// Config file first, then flag overrides.
fn build_options(args: &AnalyzeArgs) -> anyhow::Result<AnalysisOptions> {
    let mut options = match args.config.as_ref() {
        Some(path) => AnalysisOptions::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisOptions::default(),
    };

    if let Some(bytes) = args.max_total_size {
        options = options.with_max_total_size(bytes);
    }
    if let Some(count) = args.max_files {
        options = options.with_max_file_count(count);
    }
    if let Some(depth) = args.max_depth {
        options = options.with_max_depth(depth);
    }
    if let Some(bytes) = args.per_file_limit {
        options = options.with_per_file_read_limit(bytes);
    }
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout_ms(ms);
    }
    if let Some(ms) = args.insight_timeout_ms {
        options = options.with_insight_timeout_ms(ms);
    }
    Ok(options)
}

fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

pub fn list_languages() {
    println!("{:<14} {:<12} {:<28} ECOSYSTEMS", "LANGUAGE", "KIND", "EXTENSIONS");
    for def in REGISTRY.languages() {
        let extensions: Vec<String> = def.extensions.iter().map(|e| format!(".{}", e)).collect();
        let ecosystems: Vec<&str> = def.ecosystems.iter().map(|e| e.as_str()).collect();
        println!(
            "{:<14} {:<12} {:<28} {}",
            def.name,
            def.kind.as_str(),
            extensions.join(" "),
            ecosystems.join(", ")
        );
    }
}
