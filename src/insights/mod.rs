//! Optional narrative enrichment of a finished analysis.
//!
//! Providers sit behind [`InsightProvider`]; the enricher bounds every call
//! with a timeout and the analysis cancellation token and turns any failure
//! into a warning note. The rest of the result is never touched.

pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::InsightError;
use crate::report::{AnalysisNote, AnalysisResult};

pub use openai::{InsightConfig, OpenAiProvider};

/// Narrative output of a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub summary: String,
    #[serde(default)]
    pub architecture_notes: Vec<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
    #[serde(default)]
    pub technology_recommendations: Vec<String>,
    /// Name of the provider that produced the text
    #[serde(default)]
    pub provider: String,
}

/// A swappable text-generation backend.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, result: &AnalysisResult) -> Result<Insights, InsightError>;
}

pub struct InsightEnricher {
    provider: Option<Arc<dyn InsightProvider>>,
    timeout: Duration,
}

impl InsightEnricher {
    pub fn new(provider: Option<Arc<dyn InsightProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Sets `result.insights` on success; otherwise records a warning note.
    pub async fn enrich(&self, result: &mut AnalysisResult, token: &CancellationToken) {
        match self.request(result, token).await {
            Ok(insights) => {
                tracing::debug!(provider = %insights.provider, "insights attached");
                result.insights = Some(insights);
            }
            Err(InsightError::NotConfigured) => {
                result
                    .notes
                    .push(AnalysisNote::warning("insights", "no insight provider configured"));
            }
            Err(e) => {
                tracing::warn!(error = %e, "insight enrichment failed");
                result.notes.push(AnalysisNote::warning("insights", e.to_string()));
            }
        }
    }

    async fn request(&self, result: &AnalysisResult, token: &CancellationToken) -> Result<Insights, InsightError> {
        let provider = self.provider.as_ref().ok_or(InsightError::NotConfigured)?;
        tracing::debug!(provider = provider.name(), timeout = ?self.timeout, "requesting insights");

        let call = tokio::time::timeout(self.timeout, provider.summarize(result));
        let mut insights = tokio::select! {
            _ = token.cancelled() => return Err(InsightError::Http("request cancelled".to_string())),
            outcome = call => outcome.map_err(|_| InsightError::Timeout(self.timeout))??,
        };

        if insights.summary.trim().is_empty() {
            return Err(InsightError::InvalidResponse("empty summary".to_string()));
        }
        if insights.provider.is_empty() {
            insights.provider = provider.name().to_string();
        }
        Ok(insights)
    }
}
