//! CLI definitions: argument parsing, subcommands, and help text.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  ragchat                           Start an interactive chat session
  ragchat -p \"summarize July\"       Single question, answer to stdout
  ragchat -p - --sources            Read the question from stdin, list sources
  ragchat verify                    Check that all credentials are set
  ragchat config                    Show resolved settings and key status
  ragchat docs list                 List documents in the pipeline
  ragchat docs upload report.pdf    Upload a document
  ragchat docs sync                 Re-ingest pipeline documents
  ragchat completions bash          Generate bash completions
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Chat with your indexed documents from the terminal",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Ask a single question then exit (without entering the chat loop)
    #[arg(
        short = 'p',
        long,
        help = "Ask one question and print the answer (use '-' to read from stdin)"
    )]
    pub prompt: Option<String>,

    /// Print the retrieved sources under each answer
    #[arg(long, help = "Show which documents each answer was drawn from")]
    pub sources: bool,

    /// Override the completion model
    #[arg(short = 'm', long, help = "Model name (e.g. gpt-oss:120b)")]
    pub model: Option<String>,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that every required credential is present and non-empty
    Verify,
    /// Show resolved settings and credential status
    Config,
    /// Manage documents in the retrieval pipeline
    Docs {
        #[command(subcommand)]
        subcommand: DocsSubcommand,
    },
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum DocsSubcommand {
    /// List documents in the pipeline
    List {
        /// Filter documents by name or id
        #[arg(long)]
        query: Option<String>,
    },
    /// Upload one or more local files to the pipeline
    Upload {
        /// Paths of the files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete a document by its file id
    Delete {
        /// File id as shown by `docs list`
        file_id: String,
    },
    /// Trigger re-ingestion of the pipeline's documents
    Sync,
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }
}
