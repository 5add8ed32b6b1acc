#[derive(thiserror::Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Template not found: {0}")]
    MissingTemplate(String),

    #[error("Context file not found and not tracked by git: {0}")]
    MissingContextFile(String),

    #[error("No API key configured. Set WEAVE_API_KEY (or OPENAI_API_KEY), or pass --api-key")]
    MissingApiKey,

    #[error("The response was cut off at the token limit. Increase --max-tokens (or max_tokens in the template front matter) and try again")]
    Truncated,

    #[error("The model stopped before finishing (finish reason '{reason}') and nothing was written. Revise the prompt, or raise --max-tokens for long answers, and try again")]
    Incomplete { reason: String },

    #[error("Completion failed ({code}): {message}")]
    Completion { code: String, message: String },
}
