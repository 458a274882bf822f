//! Insight provider for OpenAI-compatible chat-completions endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{InsightProvider, Insights};
use crate::error::InsightError;
use crate::report::AnalysisResult;

const SYSTEM_PROMPT: &str = "You review software projects from a static technical profile. \
Reply with a JSON object with the keys summary (string), architectureNotes, \
improvementSuggestions and technologyRecommendations (arrays of short strings).";

/// Endpoint settings; the key is optional for local gateways.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

pub struct OpenAiProvider {
    config: InsightConfig,
    http: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: InsightConfig) -> Result<Self, InsightError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InsightError::Http(format!("failed to build http client: {}", e)))?;

        Ok(Self { config, http })
    }

    fn chat_completions_url(&self) -> String {
        let endpoint = self.config.endpoint.trim().trim_end_matches('/');
        if endpoint.ends_with("/chat/completions") {
            endpoint.to_string()
        } else if endpoint.ends_with("/v1") {
            format!("{}/chat/completions", endpoint)
        } else {
            format!("{}/v1/chat/completions", endpoint)
        }
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, InsightError> {
        let payload = ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(0.0),
            stream: Some(false),
        };

        let mut request = self.http.post(self.chat_completions_url()).json(&payload);
        if let Some(api_key) = self.config.api_key.as_ref() {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InsightError::Timeout(self.config.timeout)
            } else {
                InsightError::Http(format!("model={}: {}", self.config.model, e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InsightError::Http(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(InsightError::Http(format!(
                "endpoint returned HTTP {}: {}",
                status,
                truncate_for_error(&body)
            )));
        }

        let parsed: ChatCompletionsResponse = serde_json::from_str(&body).map_err(|e| {
            InsightError::InvalidResponse(format!("{} (body={})", e, truncate_for_error(&body)))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content.to_text())
            .ok_or_else(|| InsightError::InvalidResponse("response had no message content".to_string()))
    }
}

#[async_trait]
impl InsightProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn summarize(&self, result: &AnalysisResult) -> Result<Insights, InsightError> {
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(profile_prompt(result))];
        let text = self.complete(messages).await?;
        let mut insights = parse_reply(&text)?;
        insights.provider = format!("{} ({})", self.name(), self.config.model);
        Ok(insights)
    }
}

/// Compact JSON view of the profile sent as the user message.
pub fn profile_prompt(result: &AnalysisResult) -> String {
    let frameworks: Vec<&str> = result.frameworks.iter().map(|f| f.name.as_str()).collect();
    let build_systems: Vec<&str> = result.build_systems.iter().map(|b| b.name.as_str()).collect();
    let commands: Vec<&str> = result
        .execution_methods
        .iter()
        .take(10)
        .map(|m| m.command.as_str())
        .collect();

    let view = serde_json::json!({
        "name": result.basic_info.name,
        "fileCount": result.basic_info.file_count,
        "projectType": result.project_type.as_str(),
        "primaryLanguage": result.languages.primary,
        "secondaryLanguages": result.languages.secondary,
        "frameworks": frameworks,
        "buildSystems": build_systems,
        "workspace": result.workspace.workspace_type.as_str(),
        "entryPoints": result.entry_points,
        "metrics": {
            "codeLines": result.metrics.code_lines,
            "filesAnalyzed": result.metrics.files_analyzed,
            "estimatedComplexity": result.metrics.estimated_complexity.as_str(),
        },
        "quality": {
            "score": result.quality.quality_score,
            "recommendations": result.quality.recommendations,
        },
        "commands": commands,
        "observations": result.observations,
        "securityFindings": result.security_findings,
        "directories": result.structure.common_directories,
    });
    format!("Project profile:\n{}", view)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredReply {
    #[serde(default)]
    summary: String,
    #[serde(default, alias = "architecture_notes")]
    architecture_notes: Vec<String>,
    #[serde(default, alias = "improvement_suggestions")]
    improvement_suggestions: Vec<String>,
    #[serde(default, alias = "technology_recommendations")]
    technology_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Architecture,
    Improvements,
    Technology,
}

/// Reads a JSON object out of the reply, falling back to section headings.
pub fn parse_reply(text: &str) -> Result<Insights, InsightError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InsightError::InvalidResponse("empty reply".to_string()));
    }

    if let Some(reply) = json_object(text) {
        if !reply.summary.trim().is_empty() {
            return Ok(Insights {
                summary: reply.summary.trim().to_string(),
                architecture_notes: reply.architecture_notes,
                improvement_suggestions: reply.improvement_suggestions,
                technology_recommendations: reply.technology_recommendations,
                provider: String::new(),
            });
        }
    }

    Ok(parse_sections(text))
}

fn json_object(text: &str) -> Option<StructuredReply> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn parse_sections(text: &str) -> Insights {
    let mut insights = Insights::default();
    let mut summary_lines: Vec<&str> = Vec::new();
    let mut section = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(heading) = heading_section(trimmed) {
            section = Some(heading);
            continue;
        }
        let item = strip_bullet(trimmed);
        match section {
            None | Some(Section::Summary) => summary_lines.push(item),
            Some(Section::Architecture) => insights.architecture_notes.push(item.to_string()),
            Some(Section::Improvements) => insights.improvement_suggestions.push(item.to_string()),
            Some(Section::Technology) => insights.technology_recommendations.push(item.to_string()),
        }
    }

    insights.summary = summary_lines.join(" ");
    if insights.summary.is_empty() {
        insights.summary = text.lines().next().unwrap_or_default().trim().to_string();
    }
    insights
}

fn heading_section(line: &str) -> Option<Section> {
    let marked = line.starts_with('#') || line.ends_with(':') || (line.starts_with("**") && line.ends_with("**"));
    if !marked || line.len() > 60 {
        return None;
    }
    let title = line
        .trim_matches(|c: char| c == '#' || c == '*' || c == ':' || c.is_whitespace())
        .to_lowercase();

    if title.starts_with("summary") || title.starts_with("overview") {
        Some(Section::Summary)
    } else if title.contains("architecture") {
        Some(Section::Architecture)
    } else if title.contains("improvement") || title.contains("suggestion") {
        Some(Section::Improvements)
    } else if title.contains("technolog") || title.contains("recommendation") {
        Some(Section::Technology)
    } else {
        None
    }
}

fn strip_bullet(line: &str) -> &str {
    let without_marker = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "));
    if let Some(rest) = without_marker {
        return rest.trim();
    }
    // numbered: "1. item" / "2) item"
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim();
        }
    }
    line
}

fn truncate_for_error(value: &str) -> String {
    const LIMIT: usize = 400;
    if value.len() <= LIMIT {
        return value.to_string();
    }
    let mut cut = LIMIT;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &value[..cut])
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: ChatContent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatContentPart>),
}

impl ChatContent {
    fn to_text(self) -> Option<String> {
        let text = match self {
            ChatContent::Text(text) => text.trim().to_string(),
            ChatContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|p| p.text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        };
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChatContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(endpoint: &str) -> OpenAiProvider {
        OpenAiProvider::new(InsightConfig {
            endpoint: endpoint.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_chat_completions_url() {
        assert_eq!(
            provider("https://api.openai.com").chat_completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            provider("http://localhost:8080/v1/").chat_completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            provider("http://gw/openai/chat/completions").chat_completions_url(),
            "http://gw/openai/chat/completions"
        );
    }

    #[test]
    fn test_parse_json_reply_in_fence() {
        let text = "```json\n{\"summary\": \"A Vite React app.\", \"architectureNotes\": [\"SPA\"], \"improvementSuggestions\": [\"Add tests\"]}\n```";
        let insights = parse_reply(text).unwrap();
        assert_eq!(insights.summary, "A Vite React app.");
        assert_eq!(insights.architecture_notes, vec!["SPA"]);
        assert_eq!(insights.improvement_suggestions, vec!["Add tests"]);
        assert!(insights.technology_recommendations.is_empty());
    }

    #[test]
    fn test_parse_sections() {
        let text = "## Summary\nA Django service with a React front end.\n\n\
                    ## Architecture\n- Backend in api/\n- SPA in web/\n\n\
                    **Improvements**\n1. Add CI\n2) Pin dependencies\n\n\
                    Technology recommendations:\n* Consider TypeScript\n";
        let insights = parse_reply(text).unwrap();
        assert_eq!(insights.summary, "A Django service with a React front end.");
        assert_eq!(insights.architecture_notes, vec!["Backend in api/", "SPA in web/"]);
        assert_eq!(insights.improvement_suggestions, vec!["Add CI", "Pin dependencies"]);
        assert_eq!(insights.technology_recommendations, vec!["Consider TypeScript"]);
    }

    #[test]
    fn test_plain_text_becomes_summary() {
        let insights = parse_reply("Looks like a small CLI.").unwrap();
        assert_eq!(insights.summary, "Looks like a small CLI.");
    }

    #[test]
    fn test_empty_reply_is_invalid() {
        assert!(matches!(parse_reply("  \n"), Err(InsightError::InvalidResponse(_))));
    }

    #[test]
    fn test_chat_content_parts() {
        let json = r#"{"choices":[{"message":{"content":[{"type":"text","text":" one "},{"type":"text","text":"two"}]}}]}"#;
        let parsed: ChatCompletionsResponse = serde_json::from_str(json).unwrap();
        let text = parsed.choices.into_iter().next().unwrap().message.content.to_text();
        assert_eq!(text.as_deref(), Some("one\ntwo"));
    }
}
