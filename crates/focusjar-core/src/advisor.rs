//! Client for the task-relevance advisory service.
//!
//! The service judges whether a new task moves the main goal forward and
//! suggests a sharper wording. Its answer is advice only; callers add the
//! task whatever happens here. With no endpoint configured the client
//! answers "relevant, keep your wording" without touching the network.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AdvisorError;
use crate::storage::AdvisorConfig;
use crate::task::TaskKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorRequest {
    pub high_priority_task: String,
    pub current_task_text: String,
    pub task_type: TaskKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorResponse {
    pub is_relevant: bool,
    pub feedback: String,
    pub suggested_text: String,
}

impl AdvisorResponse {
    fn permissive(request: &AdvisorRequest) -> Self {
        Self {
            is_relevant: true,
            feedback: String::new(),
            suggested_text: request.current_task_text.clone(),
        }
    }
}

/// Error body returned by the proxy on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct AdvisorClient {
    endpoint: Option<Url>,
    http: Client,
}

impl AdvisorClient {
    /// Build from config. An empty endpoint yields a disabled client.
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a URL or the HTTP client
    /// cannot be built.
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let endpoint = match config.endpoint.trim() {
            "" => None,
            raw => Some(Url::parse(raw).map_err(|e| AdvisorError::InvalidEndpoint {
                endpoint: raw.to_string(),
                message: e.to_string(),
            })?),
        };
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { endpoint, http })
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Ask the service about `request`.
    ///
    /// # Errors
    /// Transport failures, non-2xx statuses, and responses missing any of
    /// the three fields are errors the caller may show and move past.
    pub async fn analyze(&self, request: &AdvisorRequest) -> Result<AdvisorResponse, AdvisorError> {
        let Some(endpoint) = &self.endpoint else {
            tracing::debug!("advisor disabled, accepting task as written");
            return Ok(AdvisorResponse::permissive(request));
        };

        let resp = self.http.post(endpoint.clone()).json(request).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), %message, "advisor request failed");
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<AdvisorResponse>(&body)
            .map_err(|e| AdvisorError::InvalidResponse(e.to_string()))
    }
}
