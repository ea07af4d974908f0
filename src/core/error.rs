//! Error taxonomy for credential loading and the two upstream services.
//!
//! Failed requests are never retried, and upstream error bodies are kept
//! verbatim in the error so nothing the service said gets swallowed.

use std::path::PathBuf;

/// The upstream service a request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// LlamaCloud pipeline API (retrieval and document management).
    Index,
    /// Ollama Cloud chat completions (OpenAI-compatible).
    Completion,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Index => "index",
            Service::Completion => "completion",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to callers of the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Required environment variables are absent. Names every missing key,
    /// not just the first one found.
    #[error("missing credentials: {}. Set them in your environment or .env file.", .keys.join(", "))]
    MissingCredentials { keys: Vec<&'static str> },

    /// A credential is present but empty or whitespace-only.
    #[error("credential {key} is set but empty")]
    InvalidCredential { key: &'static str },

    /// The service answered with a non-2xx status.
    #[error("{service} service returned HTTP {status}: {body}")]
    Upstream {
        service: Service,
        status: u16,
        body: String,
    },

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("could not reach {service} service: {source}")]
    Network {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("unexpected {service} service response: {detail}")]
    UnexpectedResponse { service: Service, detail: String },

    /// A local file could not be read for upload.
    #[error("failed to read {}: {}", .path.display(), .source)]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_names_every_key() {
        let err = GatewayError::MissingCredentials {
            keys: vec!["LLAMA_CLOUD_API_KEY", "LLAMA_ORG_ID", "OLLAMA_API_KEY"],
        };
        let msg = err.to_string();
        assert!(msg.contains("LLAMA_CLOUD_API_KEY"));
        assert!(msg.contains("LLAMA_ORG_ID"));
        assert!(msg.contains("OLLAMA_API_KEY"));
    }

    #[test]
    fn upstream_error_keeps_status_and_body() {
        let err = GatewayError::Upstream {
            service: Service::Index,
            status: 401,
            body: r#"{"detail":"Invalid authentication token"}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("index"));
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid authentication token"));
    }

    #[test]
    fn invalid_credential_names_the_key() {
        let err = GatewayError::InvalidCredential {
            key: "LLAMA_ORG_ID",
        };
        assert!(err.to_string().contains("LLAMA_ORG_ID"));
    }

    #[test]
    fn service_names_are_stable() {
        assert_eq!(Service::Index.as_str(), "index");
        assert_eq!(Service::Completion.as_str(), "completion");
        assert_eq!(Service::Completion.to_string(), "completion");
    }
}
