//! Per-author contribution summaries from an OpenAI-compatible chat API
//!
//! The summarizer is optional. The API key is passed explicitly through
//! [`SummarizerConfig`], so nothing here reads or writes process environment.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Endpoint base used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes software development contributions.";
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Summarizer errors
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Transport failure or timeout
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Response body was not a chat completion
    #[error("Malformed API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Completion carried no text
    #[error("API response contained no summary")]
    EmptyResponse,
}

/// Connection settings for the summarizer
#[derive(Clone, PartialEq, Eq)]
pub struct SummarizerConfig {
    /// Bearer token
    pub api_key: String,
    /// Chat model name
    pub model: String,
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
}

impl SummarizerConfig {
    /// Settings with the default model and endpoint
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Use a different model
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different endpoint base
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// Keep the key out of logs
impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// One author's commit messages within the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    /// Author display name
    pub author: String,
    /// Window length in months
    pub months_back: u32,
    /// Full commit messages, newest first
    pub messages: Vec<String>,
}

impl SummaryRequest {
    /// The user prompt sent to the model
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "Summarize the following software development contributions from an author named {} \
             over a period of {} months based on their commit messages. \
             Focus on key features, bug fixes, improvements, and overall progress. \
             Provide a concise yet comprehensive overview. \
             Maximum 3 sentences per commit. \
             Some commits include a change log, which is not the change itself.\n\n\
             Commit Messages:\n---\n{}\n---",
            self.author,
            self.months_back,
            self.messages.join("\n\n")
        )
    }
}

/// Produces a prose summary of one author's contributions
pub trait Summarizer {
    /// Summarize the request
    ///
    /// # Errors
    ///
    /// Returns `SummaryError` when no summary could be produced.
    fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
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

/// Summarizer calling `{base_url}/chat/completions`
#[derive(Debug)]
pub struct OpenAiSummarizer {
    config: SummarizerConfig,
    client: reqwest::blocking::Client,
}

impl OpenAiSummarizer {
    /// Build a client for `config`
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::Http` if the HTTP client cannot be built.
    pub fn new(config: SummarizerConfig) -> Result<Self, SummaryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, client })
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryError> {
        let prompt = request.prompt();
        let body = chat_request(&self.config.model, &prompt);
        let endpoint = self.config.endpoint();

        debug!(
            author = %request.author,
            messages = request.messages.len(),
            model = %self.config.model,
            endpoint = %endpoint,
            "Requesting contribution summary"
        );

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(SummaryError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_chat_response(&text)
    }
}

fn chat_request<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// Extract the first choice's text from a chat completion body
///
/// # Errors
///
/// Returns `SummaryError::Parse` for malformed JSON and
/// `SummaryError::EmptyResponse` when there is no non-blank content.
pub fn parse_chat_response(body: &str) -> Result<String, SummaryError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(SummaryError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn request() -> SummaryRequest {
        SummaryRequest {
            author: "Alice".to_string(),
            months_back: 3,
            messages: vec!["Add parser".to_string(), "Fix crash\n\nDetails".to_string()],
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = SummarizerConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = SummarizerConfig::new("sk-test").base_url("http://localhost:8080/v1/");
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = SummarizerConfig::new("sk-secret").model("gpt-4o-mini");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("gpt-4o-mini"));
    }

    #[test]
    fn test_prompt_names_author_window_and_messages() {
        let prompt = request().prompt();
        assert!(prompt.contains("named Alice"));
        assert!(prompt.contains("3 months"));
        assert!(prompt.contains("overview. Maximum 3 sentences per commit. Some commits"));
        assert!(prompt.contains("---\nAdd parser\n\nFix crash\n\nDetails\n---"));
    }

    #[test]
    fn test_request_body_shape() {
        let prompt = request().prompt();
        let body = serde_json::to_value(chat_request("gpt-3.5-turbo", &prompt)).expect("serialize");
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], prompt.as_str());
        let temperature = body["temperature"].as_f64().expect("number");
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Alice shipped a parser.\n"}}]}"#;
        assert_eq!(parse_chat_response(body).expect("parse"), "Alice shipped a parser.");
    }

    #[test]
    fn test_parse_chat_response_empty_choices() {
        let result = parse_chat_response(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(SummaryError::EmptyResponse)));
    }

    #[test]
    fn test_parse_chat_response_null_content() {
        let result = parse_chat_response(r#"{"choices":[{"message":{"content":null}}]}"#);
        assert!(matches!(result, Err(SummaryError::EmptyResponse)));
    }

    #[test]
    fn test_parse_chat_response_malformed() {
        let result = parse_chat_response("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(SummaryError::Parse(_))));
    }

    #[test]
    fn test_unreachable_endpoint_is_http_error() {
        let config = SummarizerConfig::new("sk-test").base_url("http://127.0.0.1:9");
        let summarizer = OpenAiSummarizer::new(config).expect("client");
        let result = summarizer.summarize(&request());
        assert!(matches!(result, Err(SummaryError::Http(_))), "got {result:?}");
    }
}
