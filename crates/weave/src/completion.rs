use crate::prelude::{eprintln, *};
use colored::Colorize;
use weave_core::generate::completion::{codes, DEFAULT_ENDPOINT};
use weave_core::generate::{
    effective_model, parse_response_body, token_budget, ChatRequest, CompletionOptions,
    CompletionResult,
};

/// Completion configuration, sourced once and passed to the client.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl CompletionConfig {
    /// Load configuration from environment variables
    /// Uses WEAVE_API_KEY if set, otherwise falls back to OPENAI_API_KEY
    /// Uses WEAVE_ENDPOINT with default fallback
    pub fn from_env() -> Self {
        let api_key = std::env::var("WEAVE_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.is_empty());

        Self {
            api_key,
            endpoint: std::env::var("WEAVE_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
        }
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(mut self, endpoint: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = endpoint {
            self.endpoint = url;
        }
        if let Some(key) = api_key {
            self.api_key = Some(key);
        }
        self
    }
}

/// Receives debug output from a completion.
pub trait DebugSink: Send + Sync {
    fn emit(&self, label: &str, value: &str);
}

/// Writes labelled debug sections to stderr.
pub struct StderrSink;

impl DebugSink for StderrSink {
    fn emit(&self, label: &str, value: &str) {
        eprintln!("{} {}", f!("[{label}]").bright_black(), value);
    }
}

/// Something that can turn a prompt into a completion.
#[allow(async_fn_in_trait)]
pub trait CompletionProvider {
    /// Never fails with a Rust error: every failure is a `CompletionResult::Err`.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> CompletionResult;
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct CompletionClient {
    config: CompletionConfig,
    http: reqwest::Client,
    sink: Box<dyn DebugSink>,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            sink: Box::new(StderrSink),
        }
    }

    /// Replace where debug output goes.
    pub fn with_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.sink = sink;
        self
    }
}

impl CompletionProvider for CompletionClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> CompletionResult {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return CompletionResult::error(codes::MISSING_API_KEY, "No API key configured");
        };

        let model = effective_model(options);
        let Some(max_tokens) = token_budget(prompt, options.max_tokens) else {
            return CompletionResult::error(
                codes::PROMPT_TOO_LONG,
                f!(
                    "Prompt is {} characters long, leaving no room for a completion; pass --max-tokens",
                    prompt.chars().count()
                ),
            );
        };

        if options.debug {
            self.sink.emit("model", model);
            self.sink.emit("max_tokens", &max_tokens.to_string());
        }

        log::debug!("POST {} (model {model})", self.config.endpoint);

        let request = ChatRequest::new(model, prompt, max_tokens);
        let response = match self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return CompletionResult::error(codes::FETCH_ERROR, e.to_string()),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return CompletionResult::error(codes::FETCH_ERROR, e.to_string()),
        };

        if options.debug {
            self.sink.emit("response", &body);
        }

        parse_response_body(&body, status.as_u16(), status.is_success())
    }
}
