//! Configuration: credential loading, validation, and service settings.
//!
//! Everything comes from the environment (with `.env` loaded by `main`
//! beforehand) and is checked before any network request goes out.

use std::env;

use crate::core::error::GatewayError;

/// LlamaCloud API key, sent as a bearer token on every index request.
pub const ENV_LLAMA_API_KEY: &str = "LLAMA_CLOUD_API_KEY";
/// LlamaCloud organization id, sent as a query parameter on every index request.
pub const ENV_LLAMA_ORG_ID: &str = "LLAMA_ORG_ID";
/// Ollama Cloud API key, sent as a bearer token on completion requests.
pub const ENV_OLLAMA_API_KEY: &str = "OLLAMA_API_KEY";
/// Name the Ollama key was read from in earlier revisions; still accepted.
pub const ENV_OLLAMA_ORG_ID: &str = "OLLAMA_ORG_ID";
/// Optional override for the managed pipeline id.
pub const ENV_PIPELINE_ID: &str = "LLAMA_PIPELINE_ID";
/// Optional override for the LlamaCloud API base URL.
pub const ENV_LLAMA_BASE_URL: &str = "LLAMA_BASE_URL";
/// Optional override for the Ollama Cloud API base URL.
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
/// Optional override for the completion model.
pub const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";

/// Pipeline used when `LLAMA_PIPELINE_ID` is not set.
pub const DEFAULT_PIPELINE_ID: &str = "70fa557d-916f-4372-9dd7-d85457059f10";

pub const DEFAULT_LLAMA_BASE_URL: &str = "https://api.cloud.llamaindex.ai/api/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "https://ollama.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-oss:120b";

/// The three required credentials plus the pipeline id they apply to.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub llama_api_key: String,
    pub llama_org_id: String,
    pub ollama_api_key: String,
    pub pipeline_id: String,
    pipeline_from_env: bool,
    ollama_key_from_alias: bool,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read credentials through a lookup function. Absent keys are collected
    /// so the error names every missing credential at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let llama_api_key = lookup(ENV_LLAMA_API_KEY);
        let llama_org_id = lookup(ENV_LLAMA_ORG_ID);
        let (ollama_api_key, ollama_key_from_alias) = match lookup(ENV_OLLAMA_API_KEY) {
            Some(key) => (Some(key), false),
            None => match lookup(ENV_OLLAMA_ORG_ID) {
                Some(key) => (Some(key), true),
                None => (None, false),
            },
        };

        let mut missing = Vec::new();
        if llama_api_key.is_none() {
            missing.push(ENV_LLAMA_API_KEY);
        }
        if llama_org_id.is_none() {
            missing.push(ENV_LLAMA_ORG_ID);
        }
        if ollama_api_key.is_none() {
            missing.push(ENV_OLLAMA_API_KEY);
        }
        let (Some(llama_api_key), Some(llama_org_id), Some(ollama_api_key)) =
            (llama_api_key, llama_org_id, ollama_api_key)
        else {
            return Err(GatewayError::MissingCredentials { keys: missing });
        };

        if ollama_key_from_alias {
            log::warn!(
                "{} is not set; falling back to legacy {}",
                ENV_OLLAMA_API_KEY,
                ENV_OLLAMA_ORG_ID
            );
        }

        let (pipeline_id, pipeline_from_env) = match lookup(ENV_PIPELINE_ID) {
            Some(id) if !id.trim().is_empty() => (id, true),
            _ => (DEFAULT_PIPELINE_ID.to_string(), false),
        };
        if uuid::Uuid::parse_str(&pipeline_id).is_err() {
            log::warn!("pipeline id {:?} does not look like a UUID", pipeline_id);
        }

        Ok(Credentials {
            llama_api_key,
            llama_org_id,
            ollama_api_key,
            pipeline_id,
            pipeline_from_env,
            ollama_key_from_alias,
        })
    }

    /// Reject credentials that are present but blank, before any client is
    /// built from them.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let ollama_key_name = if self.ollama_key_from_alias {
            ENV_OLLAMA_ORG_ID
        } else {
            ENV_OLLAMA_API_KEY
        };
        for (key, value) in [
            (ENV_LLAMA_API_KEY, &self.llama_api_key),
            (ENV_LLAMA_ORG_ID, &self.llama_org_id),
            (ollama_key_name, &self.ollama_api_key),
        ] {
            if value.trim().is_empty() {
                return Err(GatewayError::InvalidCredential { key });
            }
        }
        Ok(())
    }

    /// Whether the pipeline id came from `LLAMA_PIPELINE_ID` or the default.
    pub fn pipeline_from_env(&self) -> bool {
        self.pipeline_from_env
    }

    /// Whether the Ollama key was read from the legacy `OLLAMA_ORG_ID` name.
    pub fn ollama_key_from_alias(&self) -> bool {
        self.ollama_key_from_alias
    }
}

/// Validated credentials plus resolved service settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub llama_base_url: String,
    pub ollama_base_url: String,
    pub model: String,
}

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let credentials = Credentials::from_lookup(&lookup)?;
        credentials.validate()?;

        let llama_base_url = base_url(&lookup, ENV_LLAMA_BASE_URL, DEFAULT_LLAMA_BASE_URL);
        let ollama_base_url = base_url(&lookup, ENV_OLLAMA_BASE_URL, DEFAULT_OLLAMA_BASE_URL);
        let model = lookup(ENV_OLLAMA_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Config {
            credentials,
            llama_base_url,
            ollama_base_url,
            model,
        })
    }
}

fn base_url(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    let url = lookup(key).unwrap_or_else(|| default.to_string());
    url.trim_end_matches('/').to_string()
}

/// Mask a secret for terminal output. Long values keep their first and last
/// four characters; short ones are hidden entirely.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}
