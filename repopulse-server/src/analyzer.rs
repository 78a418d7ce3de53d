//! OpenAI-backed single file analyzer.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use repopulse_core::{AnalysisError, AnalysisOutcome, BoxFuture, FileAnalyzer};

use crate::config::OpenAiConfig;

const SYSTEM_PROMPT: &str = "You are a code analysis and documentation assistant.";

/// Chat-completions client that scores one file against a strict JSON schema.
#[derive(Debug, Clone)]
pub struct OpenAiAnalyzer {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_file_chars: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiAnalyzer {
    /// Build an analyzer from OpenAI settings.
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_file_chars: config.max_file_chars,
        }
    }

    async fn analyze_content(&self, content: &str) -> AnalysisOutcome {
        if content.chars().count() > self.max_file_chars {
            log::error!("file too large to analyze");
            return Err(AnalysisError::new("File is too large to analyze."));
        }
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AnalysisError::new("OPENAI_API_KEY is not set"))?;

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(key)
            .json(&self.request_body(content))
            .send()
            .await
            .map_err(|err| AnalysisError::new(format!("OpenAI request failed: {err}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("OpenAI API error ({status}): {body}");
            return Err(AnalysisError::new(format!(
                "OpenAI chat completion returned {status}: {body}"
            )));
        }
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| AnalysisError::new(format!("Failed to parse completion JSON: {err}")))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AnalysisError::new("OpenAI returned no choices"))?;
        if let Some(refusal) = message.refusal {
            return Err(AnalysisError::new(format!("model refused: {refusal}")));
        }
        let text = message
            .content
            .ok_or_else(|| AnalysisError::new("OpenAI returned an empty message"))?;
        serde_json::from_str(text.trim())
            .map_err(|err| AnalysisError::new(format!("analysis is not valid JSON: {err}")))
    }

    fn request_body(&self, content: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": analysis_prompt(content)}
            ],
            "temperature": 0.3,
            "max_tokens": 800,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "file_analysis_schema",
                    "strict": true,
                    "schema": analysis_schema()
                }
            }
        })
    }
}

impl FileAnalyzer for OpenAiAnalyzer {
    fn analyze<'a>(&'a self, content: &'a str) -> BoxFuture<'a, AnalysisOutcome> {
        Box::pin(self.analyze_content(content))
    }
}

fn analysis_prompt(content: &str) -> String {
    format!(
        "Analyze the following source file. Respond with a JSON object containing:\n\
         - 'lines_of_code': number of lines of code, excluding comments and blank lines when possible\n\
         - 'complexity_metrics': 'cyclomatic_complexity', 'halstead_metrics' (length, vocabulary, \
         difficulty, volume, effort) and 'maintainability_index'\n\
         - 'issues': identified issues, code smells or duplicated sections\n\
         - 'explanation': a short description of what the file does\n\
         - 'suggestions': suggestions for improvement\n\n\
         Return only valid JSON.\n\nFile Content:\n{content}\n\nAnalysis:"
    )
}

fn analysis_schema() -> Value {
    let nullable_number = json!({"type": ["number", "null"]});
    json!({
        "type": "object",
        "properties": {
            "lines_of_code": {"type": "number"},
            "complexity_metrics": {
                "type": "object",
                "properties": {
                    "cyclomatic_complexity": nullable_number,
                    "halstead_metrics": {
                        "type": "object",
                        "properties": {
                            "length": nullable_number,
                            "vocabulary": nullable_number,
                            "difficulty": nullable_number,
                            "volume": nullable_number,
                            "effort": nullable_number
                        },
                        "required": ["length", "vocabulary", "difficulty", "volume", "effort"],
                        "additionalProperties": false
                    },
                    "maintainability_index": nullable_number
                },
                "required": ["cyclomatic_complexity", "halstead_metrics", "maintainability_index"],
                "additionalProperties": false
            },
            "issues": {"type": "array", "items": {"type": "string"}},
            "explanation": {"type": "string"},
            "suggestions": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["lines_of_code", "complexity_metrics", "issues", "explanation", "suggestions"],
        "additionalProperties": false
    })
}
