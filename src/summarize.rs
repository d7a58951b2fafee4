//! Summarization provider abstraction and the Gemini implementation.
//!
//! Defines the [`SummaryProvider`] trait the pipeline calls per chunk, and
//! [`GeminiProvider`], which posts to the `generateContent` endpoint with
//! retry and backoff.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! A payload the provider rejects as too large surfaces as
//! [`ProviderError::PayloadTooLarge`] so callers can tell it apart from
//! other client errors.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::config::ProviderConfig;
use crate::models::{OffsetHint, RawKind, RawSection, SummaryLength};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Prompted document text is capped at this many characters.
pub const MAX_PROMPT_CHARS: usize = 30_000;

/// Content handed to a provider for one call.
#[derive(Debug, Clone, Copy)]
pub enum SummarizeInput<'a> {
    Text(&'a str),
    Binary { bytes: &'a [u8], mime: &'a str },
}

/// Provider-boundary error. Orchestration wraps this in anyhow; the variants
/// exist so callers can distinguish size rejections and keep raw bodies for
/// diagnosis.
#[derive(Debug)]
pub enum ProviderError {
    MissingKey(String),
    /// The provider rejected the payload as too large. Trigger for callers
    /// that chunk reactively.
    PayloadTooLarge(String),
    Api {
        status: u16,
        message: String,
    },
    /// The response arrived but could not be understood; `raw` carries the
    /// body for diagnosis.
    InvalidResponse {
        message: String,
        raw: String,
    },
    Network(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::MissingKey(var) => {
                write!(f, "{} environment variable not set", var)
            }
            ProviderError::PayloadTooLarge(msg) => {
                write!(f, "provider rejected payload as too large: {}", msg)
            }
            ProviderError::Api { status, message } => {
                write!(f, "provider API error {}: {}", status, message)
            }
            ProviderError::InvalidResponse { message, raw } => {
                write!(f, "invalid provider response: {} (raw: {})", message, raw)
            }
            ProviderError::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Trait for summarization providers.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Provider identifier (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Summarize one document or chunk. Returns the ordered raw section list
    /// exactly as the model produced it; identifier assignment and highlight
    /// location happen downstream.
    async fn summarize(
        &self,
        input: SummarizeInput<'_>,
        length: SummaryLength,
    ) -> Result<Vec<RawSection>, ProviderError>;
}

/// Create the configured provider.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn SummaryProvider>> {
    match config.name.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        other => bail!("Unknown summarization provider: {}", other),
    }
}

// ============ Gemini Provider ============

/// Summarization provider using the Gemini `generateContent` API.
///
/// Requires the `GEMINI_API_KEY` environment variable. Text input is embedded
/// in the prompt (capped at [`MAX_PROMPT_CHARS`]); binary input travels as an
/// inline base64 data part next to the instructions.
pub struct GeminiProvider {
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if std::env::var("GEMINI_API_KEY").is_err() {
            bail!("GEMINI_API_KEY environment variable not set");
        }
        Ok(Self {
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        })
    }

    fn request_body(&self, input: &SummarizeInput<'_>, length: SummaryLength) -> serde_json::Value {
        let parts = match input {
            SummarizeInput::Text(text) => {
                vec![serde_json::json!({ "text": build_text_prompt(text, length) })]
            }
            SummarizeInput::Binary { bytes, mime } => vec![
                serde_json::json!({ "text": build_binary_prompt(length) }),
                serde_json::json!({
                    "inline_data": {
                        "mime_type": mime,
                        "data": BASE64.encode(bytes),
                    }
                }),
            ],
        };
        serde_json::json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "temperature": 0.3,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 4096,
            }
        })
    }
}

#[async_trait]
impl SummaryProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn summarize(
        &self,
        input: SummarizeInput<'_>,
        length: SummaryLength,
    ) -> Result<Vec<RawSection>, ProviderError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::MissingKey("GEMINI_API_KEY".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, api_key
        );
        let body = self.request_body(&input, length);

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client.post(&url).json(&body).send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| ProviderError::Network(e.to_string()))?;
                        return parse_generate_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();

                    if is_payload_too_large(status.as_u16(), &body_text) {
                        return Err(ProviderError::PayloadTooLarge(body_text));
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(ProviderError::Api {
                            status: status.as_u16(),
                            message: body_text,
                        });
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    return Err(ProviderError::Api {
                        status: status.as_u16(),
                        message: body_text,
                    });
                }
                Err(e) => {
                    last_err = Some(ProviderError::Network(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ProviderError::Network("summarization failed after retries".into())))
    }
}

fn is_payload_too_large(status: u16, body: &str) -> bool {
    if status == 413 {
        return true;
    }
    let lower = body.to_lowercase();
    status == 400 && (lower.contains("too large") || lower.contains("exceeds the maximum"))
}

// ============ Prompt construction ============

fn length_instruction(length: SummaryLength) -> &'static str {
    match length {
        SummaryLength::Short => {
            "Create a very concise summary with only 3-5 key points. \
             Be brief and focus on the most critical information."
        }
        SummaryLength::Balanced => {
            "Create a balanced summary with 5-8 key points. \
             Include main ideas and important details."
        }
        SummaryLength::Detailed => {
            "Create a comprehensive summary with 8-12 points. \
             Include main ideas, supporting details, and nuances."
        }
    }
}

fn prompt_rules() -> &'static str {
    r#"IMPORTANT: Respond ONLY with valid JSON in this exact format (no markdown, no code blocks):
{
    "sections": [
        {"type": "heading", "content": "Main Topic Title"},
        {"type": "key-concept", "content": "Most important concept from the document", "sourceText": "exact quote from document", "startOffset": 120, "endOffset": 180},
        {"type": "heading", "content": "Key Findings"},
        {"type": "bullet", "content": "First key point", "sourceText": "relevant quote", "startOffset": 300, "endOffset": 360},
        {"type": "paragraph", "content": "Concluding summary paragraph", "sourceText": "relevant quote", "startOffset": 500, "endOffset": 570}
    ]
}

Rules:
- "heading" type for section titles
- "key-concept" type for the most important ideas (include sourceText)
- "bullet" type for key points (include sourceText when possible)
- "paragraph" type for detailed explanations (include sourceText when possible)
- sourceText should be exact or near-exact quotes from the document that support the summary point
- startOffset/endOffset are the character offsets of sourceText in the document, when you can determine them
- Make sure the summary accurately represents the document content"#
}

fn build_text_prompt(text: &str, length: SummaryLength) -> String {
    format!(
        "You are a document summarization expert. Analyze the following document and create a structured summary.\n\n\
         {}\n\n{}\n\nDocument to summarize:\n---\n{}\n---",
        length_instruction(length),
        prompt_rules(),
        truncate_chars(text, MAX_PROMPT_CHARS),
    )
}

fn build_binary_prompt(length: SummaryLength) -> String {
    format!(
        "You are a document summarization expert. Analyze the attached document and create a structured summary.\n\n\
         {}\n\n{}",
        length_instruction(length),
        prompt_rules(),
    )
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============ Response parsing ============

#[derive(serde::Deserialize)]
struct WireSummary {
    sections: Vec<WireSection>,
}

#[derive(serde::Deserialize)]
struct WireSection {
    #[serde(rename = "type")]
    kind: String,
    content: String,
    #[serde(rename = "sourceText")]
    source_text: Option<String>,
    #[serde(rename = "startOffset")]
    start_offset: Option<i64>,
    #[serde(rename = "endOffset")]
    end_offset: Option<i64>,
}

fn parse_generate_response(json: &serde_json::Value) -> Result<Vec<RawSection>, ProviderError> {
    let text = json
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .ok_or_else(|| ProviderError::InvalidResponse {
            message: "missing candidates[0].content.parts[0].text".to_string(),
            raw: json.to_string(),
        })?;
    parse_summary_json(text)
}

/// Parse the model's JSON summary, tolerating markdown code fences around it.
pub fn parse_summary_json(response_text: &str) -> Result<Vec<RawSection>, ProviderError> {
    let cleaned = strip_code_fences(response_text);
    let wire: WireSummary =
        serde_json::from_str(cleaned).map_err(|e| ProviderError::InvalidResponse {
            message: e.to_string(),
            raw: response_text.to_string(),
        })?;

    Ok(wire.sections.into_iter().map(into_raw_section).collect())
}

fn into_raw_section(section: WireSection) -> RawSection {
    let kind = match section.kind.as_str() {
        "heading" => RawKind::Heading,
        "bullet" => RawKind::Bullet,
        "key-concept" => RawKind::KeyConcept,
        // Unknown kinds degrade to paragraphs rather than dropping content.
        _ => RawKind::Paragraph,
    };
    let quotation = section
        .source_text
        .filter(|quote| !quote.trim().is_empty());
    let offset_hint = match (section.start_offset, section.end_offset) {
        (Some(start), Some(end)) => Some(OffsetHint { start, end }),
        _ => None,
    };
    RawSection {
        kind,
        content: section.content,
        quotation,
        offset_hint,
    }
}

fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}
