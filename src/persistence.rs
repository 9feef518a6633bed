pub mod http_auth_driven_ports;
pub mod http_task_driven_ports;
pub mod token_file;

use crate::domain::DrivenPortError;
use crate::external_connections;
use anyhow::{Context, anyhow};
use reqwest::StatusCode;
use reqwest_middleware::ClientBuilder;
use reqwest_tracing::TracingMiddleware;
use std::time::Duration;

/// Owns the client used to reach the task API.
/// Allows business logic to be agnostic of how the API is reached so driven adapters
/// can easily be swapped out for other implementations
#[derive(Clone)]
pub struct ExternalConnectivity {
    base_url: String,
    http_client: reqwest_middleware::ClientWithMiddleware,
}

impl ExternalConnectivity {
    /// Builds a client for the API rooted at `base_url`, with outgoing trace propagation
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, anyhow::Error> {
        let base_client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(request_timeout)
            .build()
            .context("building the HTTP client")?;
        let http_client = ClientBuilder::new(base_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(ExternalConnectivity {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http_client,
        })
    }
}

impl external_connections::ExternalConnectivity for ExternalConnectivity {
    fn http_client(&self) -> &reqwest_middleware::ClientWithMiddleware {
        &self.http_client
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Sorts an API response into success or the matching [DrivenPortError]
async fn check_status(
    response: reqwest::Response,
    action: &str,
) -> Result<reqwest::Response, DrivenPortError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(DrivenPortError::Unauthorized),
        StatusCode::NOT_FOUND => Err(DrivenPortError::DoesNotExist),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(DrivenPortError::CommsFailure(anyhow!(
                "{action} failed with status {status}: {body}"
            )))
        }
    }
}

/// Sends a prepared request and checks its status
async fn send_checked(
    request: reqwest_middleware::RequestBuilder,
    action: &str,
) -> Result<reqwest::Response, DrivenPortError> {
    let response = request
        .send()
        .await
        .with_context(|| format!("sending request to {action}"))?;

    check_status(response, action).await
}
