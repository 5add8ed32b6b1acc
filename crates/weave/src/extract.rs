use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;
use weave_core::generate::{extract_with, MarkdownRecognizer};

#[derive(Debug, clap::Args, Clone)]
pub struct ExtractOptions {
    /// Saved model response (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Regex recognizing file marker lines; must define a `name` group
    #[arg(long, env = "WEAVE_MARKER")]
    pub marker: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ExtractOptions, _global: crate::Global) -> Result<()> {
    let response = match &options.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| f!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read the response from stdin")?;
            buffer
        }
    };

    let recognizer = match &options.marker {
        Some(pattern) => MarkdownRecognizer::with_marker(pattern).map_err(|e| eyre!(e))?,
        None => MarkdownRecognizer::new(),
    };

    let files = extract_with(&response, &recognizer)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        eprintln!("{}", "No files found".yellow());
        return Ok(());
    }

    for file in &files {
        println!(
            "{} {}",
            file.name.bold(),
            f!("({} lines)", file.contents.lines().count()).bright_black()
        );
    }

    Ok(())
}
