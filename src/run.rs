//! Application run modes: logger init, single prompt, interactive chat.

use std::io::{self, Write};

use crate::cli::Args;
use crate::core;
use crate::core::chat::{ChatSession, Engine, Role};
use crate::core::config::Config;
use crate::core::index::SourceNode;

/// Initialize env_logger from the -v/-q flags. `RUST_LOG` still wins.
pub fn init_logger(args: &Args) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level()),
    )
    .try_init();
}

/// Run single prompt mode: ask one question, print the answer to stdout.
pub async fn run_single_prompt(args: &Args, config: &Config) {
    let prompt_arg = args.prompt.as_ref().expect("prompt is some");
    let prompt = if prompt_arg == "-" {
        match io::read_to_string(io::stdin()) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("Error reading from stdin: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        prompt_arg.clone()
    };
    let prompt = prompt.trim();
    if prompt.is_empty() {
        eprintln!("Error: empty prompt");
        std::process::exit(1);
    }

    let engine = Engine::new(config);
    let mut session = ChatSession::new();
    match engine.ask(&mut session, prompt).await {
        Ok(answer) => {
            println!("{}", answer.text);
            if args.sources {
                print_sources(&answer.sources);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

const REPL_HELP: &str = "\
Commands:
  /sources   Toggle printing sources under each answer
  /clear     Clear the conversation history
  /help      Show this help
  /quit      Exit";

/// Run the interactive chat loop on stdin/stdout.
pub async fn run_repl(args: &Args, config: &Config) {
    let engine = Engine::new(config);
    let mut session = ChatSession::new();
    let mut show_sources = args.sources;

    println!(
        "{} {} (model {}, pipeline {})",
        core::app::NAME,
        core::app::VERSION,
        config.model,
        config.credentials.pipeline_id
    );
    println!("Ask about the indexed documents. Type /help for commands.");

    let stdin = io::stdin();
    loop {
        print!("you> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{}", REPL_HELP);
                continue;
            }
            "/clear" => {
                session.clear();
                println!("History cleared.");
                continue;
            }
            "/sources" => {
                show_sources = !show_sources;
                println!("Sources {}.", if show_sources { "on" } else { "off" });
                continue;
            }
            _ => {}
        }

        match engine.ask(&mut session, input).await {
            Ok(answer) => {
                println!("\n{}\n", answer.text);
                if show_sources {
                    print_sources(&answer.sources);
                }
            }
            Err(e) => {
                // The user turn stays; the error text becomes the reply.
                let message = format!("Error: {}", e);
                eprintln!("{}", message);
                session.push(Role::Assistant, message);
            }
        }
    }
}

const SOURCE_PREVIEW_CHARS: usize = 200;

fn print_sources(sources: &[SourceNode]) {
    if sources.is_empty() {
        println!("(no sources)");
        return;
    }
    for (i, source) in sources.iter().enumerate() {
        let score = source
            .score
            .map(|s| format!(" (score {:.2})", s))
            .unwrap_or_default();
        let preview: String = source.text.chars().take(SOURCE_PREVIEW_CHARS).collect();
        println!("Source {}: {}{}", i + 1, source.file_name, score);
        println!("  {}", preview.replace('\n', " "));
    }
}
