use serde::{Deserialize, Serialize};

/// A context file handed to the prompt template.
///
/// `contents` is `None` when the file does not exist on disk yet, and
/// `previous_contents` is `None` when there is no committed version of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// File path as given by the caller (relative or absolute).
    pub name: String,
    /// Current text of the file.
    pub contents: Option<String>,
    /// Last committed text of the file.
    pub previous_contents: Option<String>,
}

impl FileContent {
    /// Build a record, rejecting one where neither side is known.
    pub fn new(
        name: impl Into<String>,
        contents: Option<String>,
        previous_contents: Option<String>,
    ) -> Option<Self> {
        if contents.is_none() && previous_contents.is_none() {
            return None;
        }

        Some(Self {
            name: name.into(),
            contents,
            previous_contents,
        })
    }

    /// Whether the file exists on disk.
    pub fn exists(&self) -> bool {
        self.contents.is_some()
    }
}

/// A file parsed out of a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFile {
    pub name: String,
    pub contents: String,
}

impl ExtractedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Outcome of applying one extracted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub file: String,
    /// `false` when the target already existed and was left untouched.
    pub generated: bool,
}
