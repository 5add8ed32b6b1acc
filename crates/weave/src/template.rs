use crate::prelude::*;
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use std::collections::BTreeMap;
use weave_core::generate::{number_lines, FileContent};

/// Data available to a prompt template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateContext {
    /// Context files, in the order they were given.
    pub files: Vec<FileContent>,
    /// `--var KEY=VALUE` pairs.
    pub vars: BTreeMap<String, String>,
    /// Path of the template being rendered.
    pub template: String,
}

handlebars_helper!(numbered: |text: str| number_lines(text));

/// Render `template` with `context`. Output is not HTML-escaped.
pub fn render(template: &str, context: &TemplateContext) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_helper("numbered", Box::new(numbered));

    handlebars
        .render_template(template, context)
        .map_err(|e| eyre!("Failed to render template: {}", e))
}
