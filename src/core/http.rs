//! Shared request plumbing for the two upstream services.
//!
//! Every failure is tagged with the service it came from. Non-2xx responses
//! keep the status code and the verbatim body; nothing is retried.

use serde::de::DeserializeOwned;

use crate::core::error::{GatewayError, Service};

/// Send a request and return the raw body of a 2xx response.
pub async fn send_text(
    service: Service,
    request: reqwest::RequestBuilder,
) -> Result<String, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|source| GatewayError::Network { service, source })?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| GatewayError::Network { service, source })?;
    if !status.is_success() {
        log::debug!("{} service returned {}: {}", service, status, body);
        return Err(GatewayError::Upstream {
            service,
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Send a request and decode the 2xx body as JSON.
pub async fn send_json<T: DeserializeOwned>(
    service: Service,
    request: reqwest::RequestBuilder,
) -> Result<T, GatewayError> {
    let body = send_text(service, request).await?;
    serde_json::from_str(&body).map_err(|e| GatewayError::UnexpectedResponse {
        service,
        detail: e.to_string(),
    })
}

/// Send a request where any 2xx status counts as success (204 included).
pub async fn send_ok(
    service: Service,
    request: reqwest::RequestBuilder,
) -> Result<(), GatewayError> {
    send_text(service, request).await.map(|_| ())
}
