pub mod apply;
pub mod completion;
pub mod extract;
pub mod include;
pub mod prompt;
pub mod types;

pub use apply::{apply, resolve_target, ApplyError};
pub use completion::{
    classify_response, effective_model, parse_response_body, token_budget, ChatRequest,
    ChatResponse, CompletionOptions, CompletionResult,
};
pub use extract::{
    extract_files, extract_with, unwrap_fenced, ExtractError, MarkdownRecognizer, Recognizer,
};
pub use include::{IncludeError, IncludeExpander};
pub use prompt::{number_lines, split_front_matter, FrontMatter};
pub use types::{ApplyResult, ExtractedFile, FileContent};
