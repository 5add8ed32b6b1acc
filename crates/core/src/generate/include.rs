//! Recursive `include:<path>` directive expansion.
//!
//! Every directive is replaced in place with the referenced file's fully
//! expanded text. Relative paths resolve against the directory of the file
//! that contains the directive (the working directory for the top-level
//! document). Paths starting with `/` resolve against the project root.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Literal that introduces a directive.
pub const DIRECTIVE: &str = "include:";

/// Error type for include expansion. Any error aborts the whole expansion.
#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    #[error("Failed to include '{}': {source}", .path.display())]
    Resolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cyclic include of '{}' ({})", .path.display(), format_chain(.chain))]
    Cyclic { path: PathBuf, chain: Vec<PathBuf> },

    #[error("'include:{directive}' is relative to the project root, but no git repository was found")]
    MissingProjectRoot { directive: String },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Path terminated by whitespace or a quote character.
fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"include:[^\s"'`]+"#).expect("valid directive regex"))
}

/// Returns true if `text` still contains at least one directive.
pub fn has_directives(text: &str) -> bool {
    directive_regex().is_match(text)
}

/// Expands `include:` directives.
#[derive(Debug, Clone)]
pub struct IncludeExpander {
    cwd: PathBuf,
    project_root: Option<PathBuf>,
}

impl IncludeExpander {
    /// Create an expander resolving top-level relative paths against `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            project_root: None,
        }
    }

    /// Set the root used for `/`-prefixed paths.
    pub fn with_project_root(mut self, root: Option<PathBuf>) -> Self {
        self.project_root = root;
        self
    }

    /// Expand every directive in `text`.
    ///
    /// `origin` is the path of the file `text` was read from, if any. It
    /// anchors relative directives and seeds cycle detection.
    pub fn expand(&self, text: &str, origin: Option<&Path>) -> Result<String, IncludeError> {
        let mut chain = Vec::new();
        if let Some(origin) = origin {
            chain.push(canonical(&self.cwd.join(origin)));
        }

        self.expand_within(text, origin, &mut chain)
    }

    fn expand_within(
        &self,
        text: &str,
        origin: Option<&Path>,
        chain: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for found in directive_regex().find_iter(text) {
            output.push_str(&text[last..found.start()]);
            last = found.end();

            let directive = &found.as_str()[DIRECTIVE.len()..];
            let target = self.resolve(directive, origin)?;

            let content = fs::read_to_string(&target).map_err(|source| IncludeError::Resolution {
                path: target.clone(),
                source,
            })?;

            let key = canonical(&target);
            if chain.contains(&key) {
                let mut cycle = chain.clone();
                cycle.push(key.clone());
                return Err(IncludeError::Cyclic {
                    path: key,
                    chain: cycle,
                });
            }

            log::debug!("including {}", target.display());

            chain.push(key);
            let expanded = self.expand_within(&content, Some(&target), chain)?;
            chain.pop();

            output.push_str(&expanded);
        }

        output.push_str(&text[last..]);
        Ok(output)
    }

    /// Resolve a directive argument to a filesystem path.
    pub fn resolve(&self, directive: &str, origin: Option<&Path>) -> Result<PathBuf, IncludeError> {
        if let Some(rooted) = directive.strip_prefix('/') {
            let root = self
                .project_root
                .as_ref()
                .ok_or_else(|| IncludeError::MissingProjectRoot {
                    directive: directive.to_string(),
                })?;
            return Ok(root.join(rooted));
        }

        let base = match origin.and_then(Path::parent) {
            Some(dir) => self.cwd.join(dir),
            None => self.cwd.clone(),
        };

        Ok(base.join(directive))
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
