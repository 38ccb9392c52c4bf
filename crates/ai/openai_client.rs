//! Chat-completions client used for content analysis.
//!
//! The model runs in JSON mode and must answer with an object holding `seo`,
//! `readability` and `engagement`, each with a `score` and `suggestions`.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::ContentAnalyzer;
use crate::domain::value_objects::analysis::AnalysisResults;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const TEMPERATURE: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

pub struct OpenAiClient {
    config: OpenAiConfig,
    http: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build OpenAI http client")?;

        Ok(Self { config, http })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

pub fn analysis_prompt(text: &str) -> String {
    format!(
        "Analyze the following text for SEO, Readability, and Engagement. \
Provide a score from 0 to 100 for each category and actionable suggestions for improvement. \
Format the output as a JSON object with keys \"seo\", \"readability\", and \"engagement\". \
Each key should have an object with \"score\" (0-100) and \"suggestions\" (an array of strings). \
Include relevant keywords for SEO (\"keywords\"), estimated grade level for readability \
(\"gradeLevel\"), and detected tone for engagement (\"tone\") if possible.\n\n\
Text to analyze:\n--- START TEXT ---\n{text}\n--- END TEXT ---\n\nJSON Output:"
    )
}

/// Extracts the analysis object from a chat-completions response body.
pub fn parse_analysis(body: &str) -> Result<AnalysisResults> {
    let response: ChatResponse =
        serde_json::from_str(body).context("completion response is not valid JSON")?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| anyhow!("completion response was empty"))?;

    serde_json::from_str::<AnalysisResults>(&content)
        .context("completion is missing a required analysis section")
}

#[async_trait]
impl ContentAnalyzer for OpenAiClient {
    async fn analyze(&self, text: &str) -> Result<AnalysisResults> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: analysis_prompt(text),
            }],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                type_: "json_object",
            },
        };

        let resp = self
            .http
            .post(self.completions_url())
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    anyhow!("OpenAI request timed out")
                } else {
                    anyhow!("OpenAI request failed: {err}")
                }
            })?;

        let status = resp.status();
        let body = resp.text().await.context("failed to read OpenAI response")?;

        if !status.is_success() {
            error!(%status, response_body = %body, "ai: completion request failed");
            bail!("OpenAI request failed with status {status}");
        }

        let analysis = parse_analysis(&body)?;
        info!(model = %self.config.model, "ai: content analysis completed");
        Ok(analysis)
    }
}
