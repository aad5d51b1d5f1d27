//! HTTP lookup client.

use crate::classifier::ErrorClassifier;
use crate::client::LookupClient;
use crate::error::{LookupError, Result};
use crate::outcome::{LookupOutcome, LookupPayload};
use async_trait::async_trait;
use consulta_core::{LookupConfig, NormalizedIdentifier};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Lookup client for the JSON lookup API.
///
/// Sends `POST {base_url}/{kind}` with the digits-only identifier and reads the
/// basic data section from the response.
pub struct HttpLookupClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl HttpLookupClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            timeout,
        })
    }

    /// Create a client against a custom URL with a custom timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            timeout,
        })
    }

    /// Set the bearer token sent with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Map a client-side deadline to [`LookupError::Timeout`].
    fn transport_error(&self, error: reqwest::Error) -> LookupError {
        if error.is_timeout() {
            LookupError::Timeout {
                after: self.timeout,
            }
        } else {
            LookupError::Network(error)
        }
    }

    fn endpoint(&self, identifier: &NormalizedIdentifier) -> String {
        format!("{}/{}", self.base_url, identifier.kind().slug())
    }

    /// Perform the request. `Ok(None)` means the service has no record.
    async fn fetch(&self, identifier: &NormalizedIdentifier) -> Result<Option<LookupPayload>> {
        let mut request = self
            .client
            .post(self.endpoint(identifier))
            .json(&LookupRequest {
                document: identifier.as_str(),
            });

        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LookupError::Status {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                LookupError::ParseError(format!("Failed to parse response: {e}"))
            }
        })?;

        if !body.is_object() {
            return Err(LookupError::ParseError(
                "expected a JSON object in lookup response".to_string(),
            ));
        }

        Ok(LookupPayload::from_response(&body))
    }
}

#[async_trait]
impl LookupClient for HttpLookupClient {
    async fn lookup(&self, identifier: &NormalizedIdentifier) -> LookupOutcome {
        match self.fetch(identifier).await {
            Ok(Some(payload)) => LookupOutcome::Success(payload),
            Ok(None) => {
                tracing::debug!("No record for {} {}", identifier.kind(), identifier);
                LookupOutcome::NotFound
            }
            Err(e) => {
                let failure = ErrorClassifier::classify(&e);
                tracing::warn!(
                    "Lookup failed for {} {}: {}",
                    identifier.kind(),
                    identifier,
                    failure
                );
                LookupOutcome::TransportFailure(failure)
            }
        }
    }

    fn client_id(&self) -> &str {
        "http"
    }
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    document: &'a str,
}
