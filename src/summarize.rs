use std::sync::LazyLock;

use async_trait::async_trait;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::captions::split_lines;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const FALLBACK_TITLE: &str = "Transcript Summary (local fallback)";
pub const EMPTY_TRANSCRIPT_SUMMARY: &str = "No transcript text available.";

const FALLBACK_MAX_CHARS: usize = 800;
const FALLBACK_MAX_LINES: usize = 5;

static JSON_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("json object regex"));

/// Short structured summary of a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub topic_name: String,
    pub topic_summary: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    /// 4xx from the model API: bad key, quota exhausted, rejected request
    #[error("model API rejected the request ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("model API returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("request to model API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model did not return valid JSON: {0}")]
    MalformedResponse(String),
}

/// Something that can turn a transcript into a [`Summary`]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<Summary, SummarizeError>;

    fn name(&self) -> &str;
}

/// Heuristic summary built from the opening lines of the transcript
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSummarizer;

impl LocalSummarizer {
    pub fn summarize_text(&self, transcript: &str) -> Summary {
        let head: String = transcript.chars().take(FALLBACK_MAX_CHARS).collect();
        let lines: Vec<&str> = split_lines(&head)
            .filter(|l| !l.trim().is_empty())
            .take(FALLBACK_MAX_LINES)
            .collect();

        let topic_summary = if lines.is_empty() {
            EMPTY_TRANSCRIPT_SUMMARY.to_string()
        } else {
            lines.join(" ")
        };

        Summary {
            topic_name: FALLBACK_TITLE.to_string(),
            topic_summary,
        }
    }
}

#[async_trait]
impl Summarizer for LocalSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<Summary, SummarizeError> {
        Ok(self.summarize_text(transcript))
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Summarizer backed by the Gemini `generateContent` API
pub struct GeminiSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiSummarizer {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn generate(&self, prompt: &str) -> Result<String, SummarizeError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = api_error_message(&text);
            return Err(if status.is_client_error() {
                SummarizeError::Client {
                    status: status.as_u16(),
                    message,
                }
            } else {
                SummarizeError::Server {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let json: GenerateContentResponse = resp.json().await?;
        extract_response_text(json)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<Summary, SummarizeError> {
        debug!("Summarizing via Gemini with model {}", self.model);
        let raw = self.generate(&build_prompt(transcript)).await?;
        parse_summary(&raw)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Tries a remote summarizer and substitutes the local heuristic on any failure.
///
/// Without a remote summarizer (no credential configured) the local one is used
/// directly and nothing touches the network.
pub struct SummaryGenerator {
    remote: Option<Box<dyn Summarizer>>,
    local: LocalSummarizer,
}

impl SummaryGenerator {
    /// Build a generator from an explicit credential; `None` means local only.
    pub fn new(client: reqwest::Client, api_key: Option<String>, model: &str, api_base: &str) -> Self {
        let remote = api_key.map(|key| {
            Box::new(GeminiSummarizer::new(client, key, model).with_api_base(api_base)) as Box<dyn Summarizer>
        });
        Self {
            remote,
            local: LocalSummarizer,
        }
    }

    pub fn local_only() -> Self {
        Self {
            remote: None,
            local: LocalSummarizer,
        }
    }

    pub fn with_remote(remote: Box<dyn Summarizer>) -> Self {
        Self {
            remote: Some(remote),
            local: LocalSummarizer,
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn summarize(&self, transcript: &str) -> Summary {
        let Some(remote) = &self.remote else {
            info!("No API key configured, using local summary");
            return self.local.summarize_text(transcript);
        };

        match remote.summarize(transcript).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("{} summarizer failed: {e}. Falling back to local summary", remote.name());
                self.local.summarize_text(transcript)
            }
        }
    }
}

fn build_prompt(transcript: &str) -> String {
    format!(
        r#"
Return ONLY valid JSON with:
  "topic_name": short title of the main topic
  "topic_summary": brief summary

No extra text, no markdown.

Transcript:
"""{transcript}"""
"#
    )
}

fn extract_response_text(json: GenerateContentResponse) -> Result<String, SummarizeError> {
    let text: String = json
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(SummarizeError::EmptyResponse);
    }
    Ok(text.to_string())
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Parse model output as a [`Summary`], recovering a JSON object embedded in
/// surrounding prose or code fences.
pub fn parse_summary(raw: &str) -> Result<Summary, SummarizeError> {
    let raw = raw.trim();
    let summary = match serde_json::from_str::<Summary>(raw) {
        Ok(summary) => summary,
        Err(_) => {
            let Some(m) = JSON_OBJECT_RE.find(raw) else {
                return Err(SummarizeError::MalformedResponse(raw.to_string()));
            };
            serde_json::from_str(m.as_str()).map_err(|e| SummarizeError::MalformedResponse(format!("{e}: {raw}")))?
        }
    };

    if summary.topic_name.trim().is_empty() || summary.topic_summary.trim().is_empty() {
        return Err(SummarizeError::MalformedResponse(format!("empty summary field: {raw}")));
    }
    Ok(summary)
}
