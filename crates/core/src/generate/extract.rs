//! Parse a model response into named files.
//!
//! A file is a marker line naming it, followed by a fenced block holding its
//! contents. What counts as a marker or a fence is decided by a [`Recognizer`],
//! so the scanning loop below never changes when the convention does.
//!
//! The default convention, [`MarkdownRecognizer`], is:
//!
//! ````text
//! FILE: src/lib.rs
//! ```rust
//! pub fn answer() -> u32 { 42 }
//! ```
//! ````
//!
//! The marker may be decorated as a markdown heading (`## FILE: x`) or bold
//! (`**FILE: x**`), and the path may be wrapped in backticks. Fences are runs
//! of three or more backticks or tildes; a block is closed by a line holding
//! exactly the same run.

use regex::Regex;

use super::types::ExtractedFile;

/// Error type for response extraction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Block for '{name}' opened on line {line} is never closed; the response is incomplete")]
    Malformed { name: String, line: usize },

    #[error("Code block opened on line {line} is never closed; the response is incomplete")]
    Unclosed { line: usize },
}

/// Decides which lines are file markers and which are fences.
pub trait Recognizer {
    /// Returns the file name when `line` is a marker.
    fn marker(&self, line: &str) -> Option<String>;

    /// Returns the delimiter that will close the block when `line` opens one.
    fn open_fence(&self, line: &str) -> Option<String>;

    /// Whether `line` closes a block opened with `delimiter`.
    fn is_close(&self, line: &str, delimiter: &str) -> bool {
        line.trim() == delimiter
    }
}

/// `FILE: <path>` markers with markdown code fences.
#[derive(Debug, Clone)]
pub struct MarkdownRecognizer {
    marker: Regex,
}

impl MarkdownRecognizer {
    /// Default marker pattern. The `name` group captures the file path.
    pub const DEFAULT_MARKER: &'static str =
        r"^\s*(?:#{1,6}\s+)?(?:\*\*)?FILE:\s*`?(?P<name>[^\s`*]+)`?(?:\*\*)?\s*$";

    pub fn new() -> Self {
        Self {
            marker: Regex::new(Self::DEFAULT_MARKER).expect("valid default marker"),
        }
    }

    /// Use a custom marker pattern. It must define a `name` capture group.
    pub fn with_marker(pattern: &str) -> Result<Self, String> {
        let marker = Regex::new(pattern).map_err(|e| format!("Invalid marker pattern: {e}"))?;

        if !marker.capture_names().any(|n| n == Some("name")) {
            return Err(format!(
                "Marker pattern '{pattern}' has no (?P<name>...) capture group"
            ));
        }

        Ok(Self { marker })
    }
}

impl Default for MarkdownRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for MarkdownRecognizer {
    fn marker(&self, line: &str) -> Option<String> {
        self.marker
            .captures(line)
            .and_then(|caps| caps.name("name"))
            .map(|m| m.as_str().to_string())
    }

    fn open_fence(&self, line: &str) -> Option<String> {
        let trimmed = line.trim_start();
        let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let run = trimmed.chars().take_while(|c| *c == fence_char).count();

        if run < 3 {
            return None;
        }

        // Backtick fences cannot carry backticks in their info string.
        let info = &trimmed[run..];
        if fence_char == '`' && info.contains('`') {
            return None;
        }

        Some(fence_char.to_string().repeat(run))
    }
}

enum State {
    SeekingMarker,
    SeekingFenceOpen {
        name: String,
    },
    InBlock {
        name: String,
        delimiter: String,
        opened_at: usize,
        lines: Vec<String>,
    },
    /// Inside a fenced block that no marker claimed.
    SkippingBlock {
        delimiter: String,
        opened_at: usize,
    },
}

/// Extract files using the default [`MarkdownRecognizer`].
pub fn extract_files(message: &str) -> Result<Vec<ExtractedFile>, ExtractError> {
    extract_with(message, &MarkdownRecognizer::new())
}

/// Extract files in order of appearance.
///
/// A response with no recognized blocks yields an empty list. Any block,
/// marked or not, that is still open when the response ends is an error and
/// nothing is returned.
pub fn extract_with(
    message: &str,
    recognizer: &dyn Recognizer,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let mut files = Vec::new();
    let mut state = State::SeekingMarker;

    for (index, line) in message.lines().enumerate() {
        state = match state {
            State::SeekingMarker => {
                if let Some(name) = recognizer.marker(line) {
                    State::SeekingFenceOpen { name }
                } else if let Some(delimiter) = recognizer.open_fence(line) {
                    State::SkippingBlock {
                        delimiter,
                        opened_at: index + 1,
                    }
                } else {
                    State::SeekingMarker
                }
            }
            State::SeekingFenceOpen { name } => {
                if let Some(next) = recognizer.marker(line) {
                    log::debug!("marker for '{name}' superseded by '{next}'");
                    State::SeekingFenceOpen { name: next }
                } else if let Some(delimiter) = recognizer.open_fence(line) {
                    State::InBlock {
                        name,
                        delimiter,
                        opened_at: index + 1,
                        lines: Vec::new(),
                    }
                } else {
                    State::SeekingFenceOpen { name }
                }
            }
            State::InBlock {
                name,
                delimiter,
                opened_at,
                mut lines,
            } => {
                if recognizer.is_close(line, &delimiter) {
                    files.push(ExtractedFile::new(name, lines.join("\n")));
                    State::SeekingMarker
                } else {
                    lines.push(line.to_string());
                    State::InBlock {
                        name,
                        delimiter,
                        opened_at,
                        lines,
                    }
                }
            }
            State::SkippingBlock {
                delimiter,
                opened_at,
            } => {
                if recognizer.is_close(line, &delimiter) {
                    State::SeekingMarker
                } else {
                    State::SkippingBlock {
                        delimiter,
                        opened_at,
                    }
                }
            }
        };
    }

    match state {
        State::InBlock {
            name, opened_at, ..
        } => Err(ExtractError::Malformed {
            name,
            line: opened_at,
        }),
        State::SeekingFenceOpen { name } => {
            log::warn!("marker for '{name}' is not followed by a code block; ignoring it");
            Ok(files)
        }
        State::SkippingBlock { opened_at, .. } => Err(ExtractError::Unclosed { line: opened_at }),
        State::SeekingMarker => Ok(files),
    }
}

/// Strip a single enclosing fence from a response.
///
/// Used when the caller already knows the one target file and the model
/// answered without markers. Text that is not fenced is returned trimmed.
pub fn unwrap_fenced(response: &str) -> String {
    let trimmed = response.trim();

    if trimmed.is_empty() {
        return String::new();
    }

    let recognizer = MarkdownRecognizer::new();
    let mut lines: Vec<&str> = trimmed.lines().collect();

    let Some(delimiter) = lines.first().and_then(|l| recognizer.open_fence(l)) else {
        return trimmed.to_string();
    };

    lines.remove(0);
    if lines
        .last()
        .is_some_and(|l| recognizer.is_close(l, &delimiter))
    {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // extract_files tests
    // ============================================================================

    #[test]
    fn test_single_block() {
        let response = "FILE: src/main.rs\n```rust\nfn main() {}\n```\n";
        let files = extract_files(response).unwrap();
        assert_eq!(files, vec![ExtractedFile::new("src/main.rs", "fn main() {}")]);
    }

    #[test]
    fn test_blocks_in_source_order_with_prose_between() {
        let response = "\
Here is the change.

FILE: b.txt
```
second-named-first
```

And the other one:

FILE: a.txt
```text
line one
line two
```
Done.";
        let files = extract_files(response).unwrap();
        assert_eq!(
            files,
            vec![
                ExtractedFile::new("b.txt", "second-named-first"),
                ExtractedFile::new("a.txt", "line one\nline two"),
            ]
        );
    }

    #[test]
    fn test_blank_lines_inside_block_preserved() {
        let response = "FILE: a.txt\n```\n\nmiddle\n\n```";
        let files = extract_files(response).unwrap();
        assert_eq!(files[0].contents, "\nmiddle\n");
    }

    #[test]
    fn test_empty_block() {
        let files = extract_files("FILE: empty.txt\n```\n```").unwrap();
        assert_eq!(files, vec![ExtractedFile::new("empty.txt", "")]);
    }

    #[test]
    fn test_no_blocks_yields_empty_list() {
        assert!(extract_files("Just some prose.\nNothing else.").unwrap().is_empty());
        assert!(extract_files("").unwrap().is_empty());
    }

    #[test]
    fn test_decorated_markers() {
        let response = "## FILE: a.rs\n```\nA\n```\n**FILE: `b.rs`**\n```\nB\n```";
        let names: Vec<_> = extract_files(response)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn test_inner_fence_with_info_string_does_not_close() {
        let response = "FILE: README.md\n````markdown\n# Title\n```sh\nmake\n```\n````";
        let files = extract_files(response).unwrap();
        assert_eq!(files[0].contents, "# Title\n```sh\nmake\n```");
    }

    #[test]
    fn test_unmarked_block_is_skipped() {
        let response = "```\nFILE: not-a-marker.txt\n```\nFILE: real.txt\n```\nok\n```";
        let files = extract_files(response).unwrap();
        assert_eq!(files, vec![ExtractedFile::new("real.txt", "ok")]);
    }

    #[test]
    fn test_later_marker_supersedes_pending_one() {
        let response = "FILE: draft.txt\nFILE: final.txt\n```\nx\n```";
        let files = extract_files(response).unwrap();
        assert_eq!(files[0].name, "final.txt");
    }

    #[test]
    fn test_crlf_line_endings() {
        let files = extract_files("FILE: a.txt\r\n```\r\none\r\ntwo\r\n```\r\n").unwrap();
        assert_eq!(files[0].contents, "one\ntwo");
    }

    #[test]
    fn test_unterminated_block_is_malformed() {
        let response = "FILE: ok.txt\n```\nfine\n```\nFILE: cut.txt\n```\npartial";
        let err = extract_files(response).unwrap_err();
        assert_eq!(
            err,
            ExtractError::Malformed {
                name: "cut.txt".to_string(),
                line: 6,
            }
        );
    }

    #[test]
    fn test_unclosed_unmarked_block_is_malformed() {
        let response = "FILE: a.txt\n```\nA\n```\n```python\npartial";
        assert_eq!(
            extract_files(response).unwrap_err(),
            ExtractError::Unclosed { line: 5 }
        );
    }

    #[test]
    fn test_dangling_marker_is_ignored() {
        let files = extract_files("FILE: a.txt\n```\nA\n```\nFILE: b.txt").unwrap();
        assert_eq!(files.len(), 1);
    }

    // ============================================================================
    // custom recognizers
    // ============================================================================

    #[test]
    fn test_custom_marker_pattern() {
        let recognizer = MarkdownRecognizer::with_marker(r"^=== (?P<name>\S+) ===$").unwrap();
        let files = extract_with("=== out.txt ===\n~~~\nhi\n~~~", &recognizer).unwrap();
        assert_eq!(files, vec![ExtractedFile::new("out.txt", "hi")]);
    }

    #[test]
    fn test_custom_marker_requires_name_group() {
        assert!(MarkdownRecognizer::with_marker(r"^FILE: \S+$").is_err());
        assert!(MarkdownRecognizer::with_marker(r"(unclosed").is_err());
    }

    struct XmlRecognizer;

    impl Recognizer for XmlRecognizer {
        fn marker(&self, line: &str) -> Option<String> {
            line.trim()
                .strip_prefix("<file path=\"")
                .and_then(|rest| rest.strip_suffix("\">"))
                .map(str::to_string)
        }

        fn open_fence(&self, line: &str) -> Option<String> {
            (line.trim() == "<content>").then(|| "</content>".to_string())
        }
    }

    #[test]
    fn test_alternate_convention_through_trait() {
        let response = "<file path=\"x.txt\">\n<content>\nX\n</content>\n</file>";
        let files = extract_with(response, &XmlRecognizer).unwrap();
        assert_eq!(files, vec![ExtractedFile::new("x.txt", "X")]);
    }

    // ============================================================================
    // unwrap_fenced tests
    // ============================================================================

    #[test]
    fn test_unwrap_plain_text_passes_through() {
        let code = "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}";
        assert_eq!(unwrap_fenced(code), code);
    }

    #[test]
    fn test_unwrap_fenced_with_language() {
        let response = "```rust\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n```";
        assert_eq!(
            unwrap_fenced(response),
            "fn add(a: i32, b: i32) -> i32 {\n    a + b\n}"
        );
    }

    #[test]
    fn test_unwrap_fence_without_close() {
        assert_eq!(unwrap_fenced("```\nabc"), "abc");
    }

    #[test]
    fn test_unwrap_empty_response() {
        assert_eq!(unwrap_fenced(""), "");
        assert_eq!(unwrap_fenced("   "), "");
    }
}
