//! Client for the sonar search/render service.
//!
//! Three stateless calls, each a single HTTP request with a JSON body:
//! - `POST /api/search`            full-text event search
//! - `PUT  /api/render`            queue an image/video render of an event
//! - `GET  /api/render/{task_id}`  render progress snapshot
//!
//! Nothing here retries; polling cadence belongs to [`crate::render`].

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{Result, SonarError};
use crate::models::{EventId, RenderJob, RenderStatus, RenderType, SearchResult};

// ============================================================================
// SonarApi trait
// ============================================================================

/// Abstraction over the remote service so the render loop can be driven
/// against a scripted backend.
#[async_trait]
pub trait SonarApi: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    async fn submit_render(&self, event_id: &EventId, render_type: RenderType)
        -> Result<RenderJob>;

    async fn render_status(&self, task_id: &str) -> Result<RenderStatus>;
}

// ============================================================================
// Wire structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    event_id: &'a EventId,
    #[serde(rename = "type")]
    render_type: RenderType,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    task_id: String,
}

// ============================================================================
// HttpSonarApi
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpSonarApi {
    client: Client,
    base_url: String,
}

impl HttpSonarApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Return the body of a 2xx response, or a `Remote` error carrying the
    /// status and whatever the server said.
    async fn success_body(response: Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let message = error_message(status, response.text().await);
            tracing::error!(status = status.as_u16(), message = %message, "Sonar API error");
            return Err(SonarError::remote(Some(status.as_u16()), message));
        }
        Ok(response.text().await?)
    }

    fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
        serde_json::from_str(body)
            .map_err(|e| SonarError::remote(None, format!("invalid {what} response: {e}")))
    }
}

#[async_trait]
impl SonarApi for HttpSonarApi {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/api/search", self.base_url);
        tracing::debug!(query = %query, "Searching events");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query })
            .send()
            .await?;
        let body = Self::success_body(response).await?;

        // Decode the envelope first so a malformed element is reported as a
        // bad result rather than a bad response.
        let raw: Vec<serde_json::Value> = Self::decode(&body, "search")?;
        let results = raw
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                serde_json::from_value::<SearchResult>(value)
                    .map_err(|e| SonarError::FieldMissing(format!("result {i}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(count = results.len(), "Search complete");
        Ok(results)
    }

    async fn submit_render(
        &self,
        event_id: &EventId,
        render_type: RenderType,
    ) -> Result<RenderJob> {
        let url = format!("{}/api/render", self.base_url);
        let response = self
            .client
            .put(&url)
            .json(&RenderRequest {
                event_id,
                render_type,
            })
            .send()
            .await?;
        let body = Self::success_body(response).await?;
        let RenderResponse { task_id } = Self::decode(&body, "render")?;

        tracing::info!(event_id = %event_id, task_id = %task_id, render_type = %render_type, "Render submitted");
        Ok(RenderJob {
            task_id,
            render_type,
        })
    }

    async fn render_status(&self, task_id: &str) -> Result<RenderStatus> {
        let url = format!("{}/api/render/{}", self.base_url, task_id);
        let response = self.client.get(&url).send().await?;
        let body = Self::success_body(response).await?;
        let status: RenderStatus = Self::decode(&body, "render status")?;

        tracing::debug!(
            task_id = %task_id,
            finished = status.finished,
            failed = status.failed,
            "Render status"
        );
        Ok(status)
    }
}

/// Message for a non-2xx response: the body if there is one, otherwise the
/// status reason. An unreadable body is reported alongside the reason.
fn error_message(status: StatusCode, body: reqwest::Result<String>) -> String {
    let reason = status.canonical_reason().unwrap_or("request failed");
    match body {
        Ok(body) if !body.trim().is_empty() => body,
        Ok(_) => reason.to_string(),
        Err(e) => {
            tracing::warn!(status = status.as_u16(), error = %e, "Failed to read error body");
            format!("{reason} (error body unreadable: {e})")
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
