//! confkit CLI
//!
//! Resolves layered configuration, validates it and writes the files
//! installed plugins generate.

mod cli;
mod commands;
mod context;
mod error;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{Cli, Commands};
use context::Project;
use error::{CliError, Result};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    confkit_core::logging::init(cli.global.verbose)
        .map_err(|e| CliError::user(format!("Failed to initialize logging: {}", e)))?;
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd, &cli.global).await,
        None => {
            println!("{} layered configuration toolkit", "confkit".green().bold());
            println!();
            println!("Run {} for available commands.", "confkit --help".cyan());
            Ok(())
        }
    }
}

async fn execute_command(cmd: Commands, global: &cli::GlobalArgs) -> Result<()> {
    match cmd {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "confkit", &mut std::io::stdout());
            Ok(())
        }
        Commands::Set { path, value } => {
            let root = context::project_root(global)?;
            commands::run_set(&root, &path, &value)
        }
        Commands::Resolve { json, provenance } => {
            let project = Project::open(global).await?;
            commands::run_resolve(&project, json, provenance).await
        }
        Commands::Get { path, json } => {
            let project = Project::open(global).await?;
            commands::run_get(&project, &path, json).await
        }
        Commands::Validate { schema, file } => {
            let project = Project::open(global).await?;
            commands::run_validate(&project, schema.as_deref(), file.as_deref()).await
        }
        Commands::Generate {
            format,
            output,
            check,
        } => {
            let project = Project::open(global).await?;
            commands::run_generate(&project, format.as_deref(), output.as_deref(), check).await
        }
        Commands::Plugins => {
            let project = Project::open(global).await?;
            commands::run_plugins(&project)
        }
        Commands::Schema => {
            let project = Project::open(global).await?;
            commands::run_schema(&project)
        }
    }
}
