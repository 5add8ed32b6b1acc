use crate::completion::{CompletionClient, CompletionConfig, CompletionProvider};
use crate::exec::{run_post_write, ExecOutcome};
use crate::prelude::{eprintln, println, *};
use crate::template::{self, TemplateContext};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use weave_core::generate::completion::codes;
use weave_core::generate::{
    apply, extract_with, split_front_matter, unwrap_fenced, ApplyResult, CompletionOptions,
    CompletionResult, ExtractedFile, FileContent, IncludeExpander, MarkdownRecognizer,
};

#[derive(Debug, clap::Args, Clone)]
pub struct GenerateOptions {
    /// Prompt template (Handlebars, with optional YAML front matter)
    pub template: PathBuf,

    /// File made available to the template as context (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<String>,

    /// Template variable as KEY=VALUE (repeatable)
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Model name (overrides the template front matter)
    #[arg(short, long, env = "WEAVE_MODEL")]
    pub model: Option<String>,

    /// Completion token budget (default: 4000 minus the prompt length)
    #[arg(long, env = "WEAVE_MAX_TOKENS")]
    pub max_tokens: Option<usize>,

    /// Print the effective model, token budget and raw response
    #[arg(long)]
    pub debug: bool,

    /// Write the extracted files instead of printing the response
    #[arg(short, long)]
    pub write: bool,

    /// Directory extracted files are written under
    #[arg(long, default_value = ".")]
    pub base_dir: PathBuf,

    /// Command to run in the base directory after files are written
    #[arg(long)]
    pub exec: Option<String>,

    /// Target file when the response contains no file markers
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the rendered prompt and stop before calling the model
    #[arg(long)]
    pub print_prompt: bool,

    /// Regex recognizing file marker lines; must define a `name` group
    #[arg(long, env = "WEAVE_MARKER")]
    pub marker: Option<String>,

    /// Completion endpoint (default: WEAVE_ENDPOINT or the OpenAI endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// API key (default: WEAVE_API_KEY or OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

fn parse_var(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| f!("Expected KEY=VALUE, got '{raw}'"))?;

    if key.trim().is_empty() {
        return Err(f!("Empty variable name in '{raw}'"));
    }

    Ok((key.trim().to_string(), value.to_string()))
}

/// Everything one generate run needs, independent of how it was parsed.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub template: PathBuf,
    pub files: Vec<String>,
    pub vars: BTreeMap<String, String>,
    pub options: CompletionOptions,
    pub write: bool,
    pub base_dir: PathBuf,
    pub exec: Option<String>,
    pub output: Option<String>,
    pub print_prompt: bool,
    pub marker: Option<String>,
}

impl From<GenerateOptions> for GenerateRequest {
    fn from(options: GenerateOptions) -> Self {
        Self {
            template: options.template,
            files: options.files,
            vars: options.vars.into_iter().collect(),
            options: CompletionOptions {
                model: options.model,
                max_tokens: options.max_tokens,
                debug: options.debug,
            },
            write: options.write,
            base_dir: options.base_dir,
            exec: options.exec,
            output: options.output,
            print_prompt: options.print_prompt,
            marker: options.marker,
        }
    }
}

/// Where a run happens.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub cwd: PathBuf,
    /// Git top-level directory, if `cwd` is inside a repository.
    pub project_root: Option<PathBuf>,
}

#[derive(Debug)]
pub enum GenerateOutcome {
    /// `--print-prompt`: the rendered prompt.
    Prompt(String),
    /// Print mode: the raw completion.
    Completion(String),
    /// Write mode, but the response held no files and no target was known.
    NoFiles(String),
    /// Write mode: per-file outcomes and the post-write command, if any.
    Applied {
        results: Vec<ApplyResult>,
        exec: Option<ExecOutcome>,
    },
}

pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let project_root = crate::git::project_root(&cwd);

    let config = CompletionConfig::from_env()
        .with_overrides(options.endpoint.clone(), options.api_key.clone());

    if global.verbose {
        eprintln!("Endpoint: {}", config.endpoint);
        eprintln!(
            "Project root: {}",
            project_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
    }

    let client = CompletionClient::new(config);
    let workspace = Workspace { cwd, project_root };

    match generate_data(&client, options.into(), &workspace).await? {
        GenerateOutcome::Prompt(text) | GenerateOutcome::Completion(text) => {
            println!("{}", text);
        }
        GenerateOutcome::NoFiles(text) => {
            eprintln!(
                "{} no file markers found in the response; printing it instead",
                "warning:".yellow().bold()
            );
            println!("{}", text);
        }
        GenerateOutcome::Applied { results, exec } => output_report(&results, exec.as_ref()),
    }

    Ok(())
}

/// Run one generation: template, includes, context, completion, and either
/// the raw text or the applied files.
pub async fn generate_data<P: CompletionProvider>(
    provider: &P,
    request: GenerateRequest,
    workspace: &Workspace,
) -> Result<GenerateOutcome> {
    let template_path = workspace.cwd.join(&request.template);
    let raw = std::fs::read_to_string(&template_path)
        .map_err(|_| Error::MissingTemplate(request.template.display().to_string()))?;

    let (front_matter, body) = split_front_matter(&raw)
        .with_context(|| f!("Invalid front matter in {}", request.template.display()))?;

    let recognizer = match &request.marker {
        Some(pattern) => MarkdownRecognizer::with_marker(pattern).map_err(|e| eyre!(e))?,
        None => MarkdownRecognizer::new(),
    };

    let expander = IncludeExpander::new(&workspace.cwd)
        .with_project_root(workspace.project_root.clone());
    let body = expander.expand(&body, Some(request.template.as_path()))?;

    let context = TemplateContext {
        files: load_context_files(&request.files, workspace)?,
        vars: request.vars,
        template: request.template.display().to_string(),
    };
    let prompt = template::render(&body, &context)?;

    if request.print_prompt {
        return Ok(GenerateOutcome::Prompt(prompt));
    }

    let options = CompletionOptions {
        model: request.options.model.or(front_matter.model),
        max_tokens: request.options.max_tokens.or(front_matter.max_tokens),
        debug: request.options.debug,
    };

    let message = match provider.complete(&prompt, &options).await {
        CompletionResult::Ok { message } => message,
        CompletionResult::Err { code, message } => return Err(completion_error(code, message).into()),
    };

    if !request.write {
        return Ok(GenerateOutcome::Completion(message));
    }

    let mut files = extract_with(&message, &recognizer)?;
    if files.is_empty() {
        match request.output.or(front_matter.output) {
            Some(target) => files.push(ExtractedFile::new(target, unwrap_fenced(&message))),
            None => return Ok(GenerateOutcome::NoFiles(message)),
        }
    }

    let base_dir = workspace.cwd.join(&request.base_dir);
    let results = apply(&base_dir, &files)?;

    let exec = match request.exec.or(front_matter.exec) {
        Some(command) => Some(run_post_write(&command, &base_dir).await),
        None => None,
    };

    Ok(GenerateOutcome::Applied { results, exec })
}

fn completion_error(code: String, message: String) -> Error {
    match code.as_str() {
        codes::MISSING_API_KEY => Error::MissingApiKey,
        codes::LENGTH => Error::Truncated,
        reason if codes::EARLY_FINISH.contains(&reason) => Error::Incomplete {
            reason: reason.to_string(),
        },
        _ => Error::Completion { code, message },
    }
}

fn load_context_files(names: &[String], workspace: &Workspace) -> Result<Vec<FileContent>> {
    let mut files = Vec::with_capacity(names.len());

    for name in names {
        let path = workspace.cwd.join(name);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e).with_context(|| f!("Failed to read context file '{name}'")),
        };
        let previous = workspace
            .project_root
            .as_deref()
            .and_then(|root| crate::git::committed_contents(root, &path));

        let file = FileContent::new(name.clone(), contents, previous)
            .ok_or_else(|| Error::MissingContextFile(name.clone()))?;
        files.push(file);
    }

    Ok(files)
}

fn output_report(results: &[ApplyResult], exec: Option<&ExecOutcome>) {
    for result in results {
        if result.generated {
            eprintln!("{} {}", "created".green().bold(), result.file);
        } else {
            eprintln!(
                "{} {} (already exists)",
                "skipped".yellow().bold(),
                result.file
            );
        }
    }

    let skipped = results.iter().filter(|r| !r.generated).count();
    if skipped > 0 {
        eprintln!(
            "{} file(s) left untouched; remove them and run again to regenerate",
            skipped
        );
    }

    if let Some(exec) = exec {
        match (&exec.error, exec.success) {
            (_, true) => eprintln!("{} {}", "ran".green().bold(), exec.command),
            (Some(error), _) => eprintln!(
                "{} could not run '{}': {}",
                "warning:".yellow().bold(),
                exec.command,
                error
            ),
            (None, false) => eprintln!(
                "{} '{}' exited with status {}",
                "warning:".yellow().bold(),
                exec.command,
                exec.code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
        }
    }
}
