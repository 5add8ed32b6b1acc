use crate::prelude::{eprintln, *};
use std::path::PathBuf;
use weave_core::generate::IncludeExpander;

#[derive(Debug, clap::Args, Clone)]
pub struct ExpandOptions {
    /// File whose include directives should be expanded
    pub file: PathBuf,
}

pub async fn run(options: ExpandOptions, global: crate::Global) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let project_root = crate::git::project_root(&cwd);

    if global.verbose {
        eprintln!("Expanding {}", options.file.display());
    }

    let text = std::fs::read_to_string(cwd.join(&options.file))
        .with_context(|| f!("Failed to read {}", options.file.display()))?;

    let expanded = IncludeExpander::new(&cwd)
        .with_project_root(project_root)
        .expand(&text, Some(options.file.as_path()))?;

    anstream::print!("{}", expanded);

    Ok(())
}
