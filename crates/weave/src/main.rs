#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod completion;
mod error;
mod exec;
mod expand;
mod extract;
mod generate;
mod git;
mod prelude;
mod template;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Assemble a prompt from a template and included files, send it to a model, and write the files it answers with"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "WEAVE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Render a template, call the model, and print or write the result
    Generate(crate::generate::GenerateOptions),

    /// Print a file with its include directives expanded
    Expand(crate::expand::ExpandOptions),

    /// List the files a saved model response would produce
    Extract(crate::extract::ExtractOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Generate(options) => crate::generate::run(options, app.global).await,
        SubCommands::Expand(options) => crate::expand::run(options, app.global).await,
        SubCommands::Extract(options) => crate::extract::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
