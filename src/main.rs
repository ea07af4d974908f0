//! # ragchat - chat with your indexed documents
//!
//! Main entry point. Credentials come from the environment (or a local
//! `.env`), context comes from a LlamaCloud retrieval pipeline, and answers
//! come from an Ollama Cloud model.
//!
//! ## Modes
//! - Single question with `-p` or `--prompt`
//! - Interactive chat loop (default)
//! - `verify`, `config`, and `docs` subcommands for credential and
//!   document management

mod cli;
mod core;
mod run;

use clap::{CommandFactory, Parser};
use dotenv::dotenv;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let args = cli::Args::parse();
    run::init_logger(&args);

    match &args.command {
        Some(cli::Commands::Verify) => {
            core::cli::run_verify();
            return;
        }
        Some(cli::Commands::Config) => {
            core::cli::run_config();
            return;
        }
        Some(cli::Commands::Completions { shell }) => {
            let mut cmd = cli::Args::command();
            let name = cmd.get_name().to_string();
            cli::generate(*shell, &mut cmd, name, &mut std::io::stdout());
            return;
        }
        Some(cli::Commands::Docs { subcommand }) => {
            let config = load_config_or_exit();
            match subcommand {
                cli::DocsSubcommand::List { query } => {
                    core::cli::run_docs_list(&config, query.as_deref()).await
                }
                cli::DocsSubcommand::Upload { paths } => {
                    core::cli::run_docs_upload(&config, paths).await
                }
                cli::DocsSubcommand::Delete { file_id } => {
                    core::cli::run_docs_delete(&config, file_id).await
                }
                cli::DocsSubcommand::Sync => core::cli::run_docs_sync(&config).await,
            }
            return;
        }
        None => {}
    }

    let mut config = load_config_or_exit();
    if let Some(model) = &args.model {
        config.model = model.clone();
    }

    if args.prompt.is_some() {
        run::run_single_prompt(&args, &config).await;
    } else {
        run::run_repl(&args, &config).await;
    }
}

/// Load configuration, printing a user-friendly message on failure
/// (Display, not Debug) before exiting non-zero.
fn load_config_or_exit() -> core::config::Config {
    core::config::Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}
