//! Completion request/response contract.
//!
//! Everything here is pure: option defaults, the chat-completions wire
//! format, and the classification of a provider reply into a
//! [`CompletionResult`]. The HTTP call itself lives in the shell.

use serde::{Deserialize, Serialize};

/// Model used when neither the caller nor the template picks one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Endpoint used when no override is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Prompt length plus completion budget when no budget is given.
pub const TOKEN_CEILING: usize = 4000;

/// The only finish reason that yields a successful completion.
pub const FINISH_STOP: &str = "stop";

/// Error codes produced on this side of the wire.
pub mod codes {
    pub const MISSING_API_KEY: &str = "missing_api_key";
    pub const FETCH_ERROR: &str = "fetch_error";
    pub const PROMPT_TOO_LONG: &str = "prompt_too_long";
    pub const INVALID_RESPONSE: &str = "invalid_response";
    pub const PROVIDER_ERROR: &str = "provider_error";
    pub const LENGTH: &str = "length";
    pub const CONTENT_FILTER: &str = "content_filter";
    pub const TOOL_CALLS: &str = "tool_calls";
    pub const FUNCTION_CALL: &str = "function_call";

    /// Finish reasons other than `stop`. These surface as error codes when a
    /// completion ends early.
    pub const EARLY_FINISH: &[&str] = &[LENGTH, CONTENT_FILTER, TOOL_CALLS, FUNCTION_CALL];
}

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub max_tokens: Option<usize>,
    /// Emit the effective model, budget and raw response to the debug sink.
    pub debug: bool,
}

/// Result of one completion. Failures are data, not panics or `Err`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CompletionResult {
    Ok { message: String },
    Err { code: String, message: String },
}

impl CompletionResult {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Err {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Model to request: the explicit one, else [`DEFAULT_MODEL`].
pub fn effective_model(options: &CompletionOptions) -> &str {
    options.model.as_deref().unwrap_or(DEFAULT_MODEL)
}

/// Completion budget for `prompt`.
///
/// An explicit budget wins. Otherwise the budget is [`TOKEN_CEILING`] minus
/// the prompt length in characters, an approximation rather than a token
/// count. Returns `None` when nothing is left for the completion.
pub fn token_budget(prompt: &str, max_tokens: Option<usize>) -> Option<usize> {
    let budget = match max_tokens {
        Some(explicit) => explicit,
        None => TOKEN_CEILING.checked_sub(prompt.chars().count())?,
    };

    (budget > 0).then_some(budget)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Request body for a chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl<'a> ChatRequest<'a> {
    /// A single user turn at temperature 0.
    pub fn new(model: &'a str, prompt: &'a str, max_tokens: usize) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub error: Option<ProviderError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error payload. Providers disagree on whether `code` is a string, a
/// number or null, so it is kept loose.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ProviderError {
    fn code(&self) -> String {
        match &self.code {
            Some(serde_json::Value::String(code)) if !code.is_empty() => code.clone(),
            Some(serde_json::Value::Number(code)) => code.to_string(),
            _ => self
                .kind
                .clone()
                .unwrap_or_else(|| codes::PROVIDER_ERROR.to_string()),
        }
    }
}

/// Classify a decoded provider reply.
pub fn classify_response(response: ChatResponse) -> CompletionResult {
    if let Some(error) = response.error {
        return CompletionResult::error(error.code(), error.message);
    }

    let Some(choice) = response.choices.into_iter().next() else {
        return CompletionResult::error(codes::INVALID_RESPONSE, "Response contained no choices");
    };

    match choice.finish_reason.as_deref() {
        Some(FINISH_STOP) => CompletionResult::Ok {
            message: choice
                .message
                .and_then(|m| m.content)
                .unwrap_or_default(),
        },
        Some(reason) => CompletionResult::error(
            reason,
            format!("Completion stopped early (finish reason '{reason}'); the output is incomplete"),
        ),
        None => CompletionResult::error(
            codes::INVALID_RESPONSE,
            "Response did not include a finish reason",
        ),
    }
}

/// Decode and classify a raw response body.
///
/// `success` is whether the HTTP status was 2xx. A body that cannot be
/// decoded is reported with the status so the caller sees what came back.
pub fn parse_response_body(body: &str, status: u16, success: bool) -> CompletionResult {
    match serde_json::from_str::<ChatResponse>(body) {
        Ok(response) if response.error.is_some() || success => classify_response(response),
        Ok(_) => CompletionResult::error(
            codes::PROVIDER_ERROR,
            format!("Provider returned HTTP {status}"),
        ),
        Err(e) => CompletionResult::error(
            codes::INVALID_RESPONSE,
            format!("Could not decode provider response (HTTP {status}): {e}"),
        ),
    }
}
