//! HTTP client for the answering service
//!
//! The answering service is an external collaborator reached through one
//! contract: `POST /api/ask` with a JSON question, answered with a JSON
//! body carrying the answer text plus optional citation and follow-up
//! metadata. A secondary `GET /api/stats` endpoint reports what the
//! service has indexed.
//!
//! Failure mapping is strict: a non-2xx response becomes
//! [`PoliqaError::Service`] (carrying the payload's error string when one
//! is present), while a request that never produced a response becomes
//! [`PoliqaError::Transport`]. The two are never conflated.

use crate::error::{PoliqaError, Result};
use crate::store::Source;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback text when a non-2xx response carries no usable error string
const GENERIC_SERVICE_ERROR: &str = "The service returned an unexpected error.";

/// Request body for `POST /api/ask`
#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

/// Successful response from `POST /api/ask`
///
/// Missing `sources`/`follow_ups` arrays are treated as empty.
#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    /// Raw answer text
    pub answer: String,
    /// Grounding citations, ordered by the service
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Suggested follow-up questions
    #[serde(default)]
    pub follow_ups: Vec<String>,
}

/// Error payload shape for non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Response from `GET /api/stats`
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    /// Number of indexed documents
    #[serde(default)]
    pub documents: usize,
    /// Number of indexed chunks
    #[serde(default)]
    pub chunks: usize,
    /// Embedding model identifier
    #[serde(default)]
    pub embedding_model: String,
    /// Generation backend identifier
    #[serde(default)]
    pub llm_backend: String,
    /// Whether the service has a loaded index
    #[serde(default)]
    pub index_loaded: bool,
    /// Names of the indexed documents
    #[serde(default)]
    pub doc_names: Vec<String>,
}

/// Client for the answering service
pub struct AskClient {
    client: Client,
    base_url: String,
}

impl AskClient {
    /// Create a new client for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use poliqa::client::AskClient;
    ///
    /// let client = AskClient::new("http://localhost:5000", 60);
    /// assert!(client.is_ok());
    /// ```
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("poliqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PoliqaError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The configured service base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask a question and return the parsed answer
    ///
    /// # Errors
    ///
    /// - [`PoliqaError::Transport`] when no response was received
    /// - [`PoliqaError::Service`] on a non-2xx status; the message is the
    ///   payload's `error` string when present, else a generic fallback.
    ///   A 2xx response whose body cannot be parsed also maps here, with
    ///   the status preserved.
    pub async fn ask(&self, question: &str) -> Result<AskResponse> {
        let url = format!("{}/api/ask", self.base_url);
        tracing::debug!("Sending question to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request to answering service failed: {}", e);
                PoliqaError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .error
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| GENERIC_SERVICE_ERROR.to_string());
            tracing::warn!("Answering service returned {}: {}", status, message);
            return Err(PoliqaError::Service {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let parsed: AskResponse = response.json().await.map_err(|e| {
            tracing::warn!("Answering service returned an unparseable body: {}", e);
            PoliqaError::Service {
                status: status.as_u16(),
                message: format!("Malformed response body: {}", e),
            }
        })?;

        tracing::debug!(
            "Received answer with {} sources and {} follow-ups",
            parsed.sources.len(),
            parsed.follow_ups.len()
        );
        Ok(parsed)
    }

    /// Fetch index statistics from the service
    pub async fn stats(&self) -> Result<StatsResponse> {
        let url = format!("{}/api/stats", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::debug!("Stats request failed: {}", e);
            PoliqaError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(PoliqaError::Service {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| GENERIC_SERVICE_ERROR.to_string()),
            }
            .into());
        }

        Ok(response.json().await.map_err(|e| PoliqaError::Service {
            status: status.as_u16(),
            message: format!("Malformed stats body: {}", e),
        })?)
    }
}
