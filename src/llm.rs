//! Language model client.
//!
//! Wraps an OpenAI-compatible chat-completions call under a fixed candidate
//! persona: the model answers recruiter questions in the first person, with
//! retrieved background passed in as an authoritative context block. Raw
//! replies are post-processed to defend against models that repeat
//! themselves, and replies too short to be useful are replaced with a
//! clarification request.
//!
//! The network seam is the [`ChatBackend`] trait, so hosts and tests can
//! substitute the HTTP transport.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::credentials::ApiToken;

/// Fixed reply when generation fails; end users always get a conversational
/// answer, never a raw error.
pub const APOLOGY_REPLY: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again later.";

/// Substituted when the cleaned reply is too short to be a real answer.
const CLARIFICATION_REPLY: &str =
    "I'd be happy to help with your recruiting question. Could you provide more specific details?";

/// Cleaned replies keep at most this many lines.
const MAX_REPLY_LINES: usize = 5;

/// Replies shorter than this are considered non-answers.
const MIN_REPLY_CHARS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("empty response from model")]
    EmptyResponse,
    #[error("no API token available; set HUGGINGFACE_API_TOKEN or configure llm.token_file")]
    MissingCredential,
}

/// Transport behind [`LlmClient`]: takes a system instruction and a user
/// question, returns the raw model reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError>;
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat-completions transport (Hugging Face router by
/// default). A single attempt per call with a request timeout; transient
/// failures are handled by the caller's fallback policy, not by retrying
/// here.
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    token: ApiToken,
    max_tokens: u32,
    temperature: f32,
}

impl HttpChatBackend {
    pub fn new(config: &LlmConfig, token: ApiToken) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            token,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token.reveal()))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = response.json().await?;
        let content = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(content.to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// The candidate persona over a [`ChatBackend`].
pub struct LlmClient {
    backend: Box<dyn ChatBackend>,
}

impl LlmClient {
    pub fn new(backend: Box<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Build a client over the HTTP transport using a resolved API token.
    pub fn from_config(config: &LlmConfig, token: ApiToken) -> Result<Self, LlmError> {
        Ok(Self::new(Box::new(HttpChatBackend::new(config, token)?)))
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Generate an answer to `question`, optionally grounded in retrieved
    /// `context`.
    ///
    /// Errors propagate as values; the orchestrator decides the fallback
    /// policy (retry without context, then the fixed apology).
    pub async fn generate(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<String, LlmError> {
        let system = build_system_message(context);
        let raw = self.backend.chat(&system, question).await?;
        Ok(clean_reply(&raw))
    }
}

/// Assemble the persona system instruction, with retrieved context appended
/// as the final background block when present.
fn build_system_message(context: Option<&str>) -> String {
    let mut message = String::from(
        "You are a professional job candidate responding to questions from recruiters \
         and hiring managers. You should answer questions about your experience, skills, \
         and qualifications in a confident, professional, and authentic way.\n\
         \n\
         Key guidelines:\n\
         - Speak in the first person as the candidate\n\
         - Maintain a professional tone\n\
         - Keep responses concise but informative (2-3 sentences)\n\
         - Be honest about your capabilities; do not claim skills or experience that are not in your background\n\
         - Do not disclose specific employer names or employment dates\n\
         - Do not claim a willingness to relocate\n\
         - Show interest in learning and growth\n",
    );

    if let Some(context) = context {
        message.push_str(&format!(
            "\nYour background and experience:\n{context}\n\n\
             Use this information to answer questions about your qualifications and experience."
        ));
    }

    message
}

/// Clean up a raw model reply.
///
/// Trims whitespace, drops blank lines, removes lines identical to one
/// already kept (first occurrence wins), and caps the reply at
/// [`MAX_REPLY_LINES`] lines. A cleaned reply shorter than
/// [`MIN_REPLY_CHARS`] characters becomes a clarification request instead of
/// a near-empty answer.
fn clean_reply(raw: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();

    for line in raw.trim().lines() {
        let line = line.trim();
        if line.is_empty() || kept.contains(&line) {
            continue;
        }
        kept.push(line);
        if kept.len() == MAX_REPLY_LINES {
            break;
        }
    }

    let cleaned = kept.join("\n");
    if cleaned.chars().count() < MIN_REPLY_CHARS {
        return CLARIFICATION_REPLY.to_string();
    }

    cleaned
}
