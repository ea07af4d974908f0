//! Credential verification behind the `verify` command.
//!
//! Checks run on raw environment lookups so the report still works when
//! config loading would refuse to. Secret values are masked before they
//! reach the report; only the pipeline id is shown in full.

use crate::core::config::{
    self, ENV_LLAMA_API_KEY, ENV_LLAMA_ORG_ID, ENV_OLLAMA_API_KEY, ENV_OLLAMA_ORG_ID,
    ENV_PIPELINE_ID,
};

/// Outcome of checking one credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Present and non-blank.
    Ok,
    /// Not set at all.
    Missing,
    /// Set but empty or whitespace-only.
    Blank,
}

/// One line of the verification report.
#[derive(Debug, Clone)]
pub struct Check {
    pub label: &'static str,
    pub key: &'static str,
    pub status: CheckStatus,
    /// Masked value, present only for `Ok` checks.
    pub display: Option<String>,
    /// Extra detail: alias fallback, defaulted pipeline, shape warnings.
    pub note: Option<String>,
}

/// The full verification report. `ok` reflects the required credentials;
/// the pipeline line is informational.
#[derive(Debug, Clone)]
pub struct Report {
    pub checks: Vec<Check>,
    pub ok: bool,
}

/// Check the process environment.
pub fn check_env() -> Report {
    check(|key| std::env::var(key).ok())
}

/// Check credentials through a lookup function.
pub fn check(lookup: impl Fn(&str) -> Option<String>) -> Report {
    let checks = vec![
        required(&lookup, "LlamaCloud API Key", ENV_LLAMA_API_KEY),
        required(&lookup, "LlamaCloud Organization ID", ENV_LLAMA_ORG_ID),
        ollama_key(&lookup),
        pipeline(&lookup),
    ];
    let ok = checks.iter().all(|c| c.status == CheckStatus::Ok);
    Report { checks, ok }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    label: &'static str,
    key: &'static str,
) -> Check {
    let (status, display) = match lookup(key) {
        Some(value) if !value.trim().is_empty() => (CheckStatus::Ok, Some(config::mask(&value))),
        Some(_) => (CheckStatus::Blank, None),
        None => (CheckStatus::Missing, None),
    };
    Check {
        label,
        key,
        status,
        display,
        note: None,
    }
}

fn ollama_key(lookup: &impl Fn(&str) -> Option<String>) -> Check {
    let primary = required(lookup, "Ollama Cloud API Key", ENV_OLLAMA_API_KEY);
    if primary.status != CheckStatus::Missing {
        return primary;
    }
    let fallback = required(lookup, "Ollama Cloud API Key", ENV_OLLAMA_ORG_ID);
    match fallback.status {
        CheckStatus::Ok => Check {
            note: Some(format!("via legacy {}", ENV_OLLAMA_ORG_ID)),
            ..fallback
        },
        CheckStatus::Blank => fallback,
        CheckStatus::Missing => primary,
    }
}

fn pipeline(lookup: &impl Fn(&str) -> Option<String>) -> Check {
    let (value, mut note) = match lookup(ENV_PIPELINE_ID) {
        Some(id) if !id.trim().is_empty() => (id, None),
        _ => (
            config::DEFAULT_PIPELINE_ID.to_string(),
            Some("default".to_string()),
        ),
    };
    if uuid::Uuid::parse_str(&value).is_err() {
        note = Some(match note {
            Some(n) => format!("{}; not a UUID", n),
            None => "not a UUID".to_string(),
        });
    }
    Check {
        label: "Pipeline ID",
        key: ENV_PIPELINE_ID,
        status: CheckStatus::Ok,
        display: Some(value),
        note,
    }
}
