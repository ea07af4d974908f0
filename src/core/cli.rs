//! CLI-only commands: credential verification, config display, and pipeline
//! document management.
//!
//! These run without the chat loop and produce plain text output.

use std::env;
use std::path::PathBuf;

use crate::core::config::{self, Config};
use crate::core::index::{self, IndexClient};
use crate::core::verify::{self, CheckStatus};

/// Run the `verify` command: print the credential checklist.
/// Exits non-zero when a required credential is missing or blank.
pub fn run_verify() {
    let report = verify::check_env();

    println!("{}", "=".repeat(60));
    println!("Credential verification");
    println!("{}", "=".repeat(60));
    for check in &report.checks {
        let (icon, value) = match check.status {
            CheckStatus::Ok => ("✅", check.display.clone().unwrap_or_default()),
            CheckStatus::Missing => ("❌", "NOT SET".to_string()),
            CheckStatus::Blank => ("❌", "set but empty".to_string()),
        };
        match &check.note {
            Some(note) => println!("{} {}: {} ({})", icon, check.label, value, note),
            None => println!("{} {}: {}", icon, check.label, value),
        }
    }
    println!("{}", "=".repeat(60));

    if report.ok {
        println!("✅ All required credentials are configured.");
    } else {
        println!("❌ Some credentials are missing.");
        println!();
        println!("Set the following environment variables (or add them to .env):");
        for check in report.checks.iter().filter(|c| c.status != CheckStatus::Ok) {
            println!("  - {}: {}", check.key, check.label);
        }
        std::process::exit(1);
    }
}

fn setting(key: &'static str, default: &str) -> (String, String) {
    match env::var(key).ok().filter(|s| !s.trim().is_empty()) {
        Some(value) => (value, format!("from {}", key)),
        None => (default.to_string(), "default".to_string()),
    }
}

/// Run the `config` command: display resolved settings and credential status.
pub fn run_config() {
    let (llama_base, llama_src) =
        setting(config::ENV_LLAMA_BASE_URL, config::DEFAULT_LLAMA_BASE_URL);
    let (ollama_base, ollama_src) =
        setting(config::ENV_OLLAMA_BASE_URL, config::DEFAULT_OLLAMA_BASE_URL);
    let (model, model_src) = setting(config::ENV_OLLAMA_MODEL, config::DEFAULT_MODEL);
    let (pipeline, pipeline_src) = setting(config::ENV_PIPELINE_ID, config::DEFAULT_PIPELINE_ID);

    println!("Index URL:  {} ({})", llama_base, llama_src);
    println!("Chat URL:   {} ({})", ollama_base, ollama_src);
    println!("Model:      {} ({})", model, model_src);
    println!("Pipeline:   {} ({})", pipeline, pipeline_src);
    println!();

    let report = verify::check(|key| env::var(key).ok());
    for check in report
        .checks
        .iter()
        .filter(|c| c.key != config::ENV_PIPELINE_ID)
    {
        let status = match check.status {
            CheckStatus::Ok => "set ✓",
            CheckStatus::Missing => "not set",
            CheckStatus::Blank => "set but empty",
        };
        println!("{}: {}", check.label, status);
    }
}

/// Run `docs list`: show pipeline documents, optionally filtered.
pub async fn run_docs_list(config: &Config, query: Option<&str>) {
    let client = IndexClient::new(config);
    let files = match client.list_files().await {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filtered = index::filter_files(&files, query.unwrap_or(""));
    if filtered.is_empty() {
        println!("No documents found.");
        return;
    }

    let name_w = filtered
        .iter()
        .map(|f| f.name.len())
        .max()
        .unwrap_or(30)
        .max(30);
    println!("{:<name_w$}  {}", "Name", "ID");
    println!("{}  {}", "-".repeat(name_w), "-".repeat(36));
    for f in &filtered {
        println!("{:<name_w$}  {}", f.name, f.id);
    }
    println!("\n{} document(s) listed", filtered.len());
}

/// Run `docs upload`: upload each file in turn, reporting per-file results.
/// Keeps going after a failure so one bad path doesn't block the batch.
pub async fn run_docs_upload(config: &Config, paths: &[PathBuf]) {
    let client = IndexClient::new(config);
    let mut failures = 0;
    for path in paths {
        match client.upload_file(path).await {
            Ok(id) => println!("✅ {} -> {}", path.display(), id),
            Err(e) => {
                eprintln!("❌ {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        eprintln!("{} upload(s) failed", failures);
        std::process::exit(1);
    }
    println!("Run `{} docs sync` to start ingestion.", crate::core::app::NAME);
}

/// Run `docs delete`: remove one document by id.
pub async fn run_docs_delete(config: &Config, file_id: &str) {
    let client = IndexClient::new(config);
    match client.delete_file(file_id).await {
        Ok(()) => println!("Deleted {}", file_id),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run `docs sync`: trigger re-ingestion of pipeline documents.
pub async fn run_docs_sync(config: &Config) {
    let client = IndexClient::new(config);
    match client.sync().await {
        Ok(()) => println!("Pipeline sync started."),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
