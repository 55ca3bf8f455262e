//! HTTP client for the resume endpoints. The editing engine talks to the
//! server only through this type, via the `SaveBackend` port.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::editor::ports::{SaveBackend, SaveError};
use crate::export::{ExportFormat, LayoutVariant};
use crate::models::resume::{ResumeRecord, Revision, SaveResumeRequest, SaveResumeResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Reads only; saves are never retried automatically.
const MAX_READ_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
    #[serde(default)]
    current_revision: Option<Revision>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn resume_url(&self, id: Uuid) -> String {
        format!("{}/api/v1/resumes/{id}", self.base_url)
    }

    /// Downloads a rendered export body.
    pub async fn download_export(
        &self,
        id: Uuid,
        format: ExportFormat,
        layout: LayoutVariant,
    ) -> Result<Bytes, SaveError> {
        let url = format!("{}/export", self.resume_url(id));
        let query = [("format", query_value(&format)), ("layout", query_value(&layout))];
        let response = self
            .get_with_retry(|| self.client.get(&url).query(&query))
            .await?;
        let response = check_status(id, response).await?;
        response
            .bytes()
            .await
            .map_err(|e| SaveError::Network(e.to_string()))
    }

    /// GET with exponential backoff on transport errors and 5xx.
    async fn get_with_retry<F>(&self, build: F) -> Result<Response, SaveError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = SaveError::Network("no attempt made".to_string());
        for attempt in 0..MAX_READ_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(250 * (1 << (attempt - 1)));
                warn!("GET attempt {attempt} failed, retrying after {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
            }
            match build().send().await {
                Ok(response) if response.status().is_server_error() => {
                    let status = response.status().as_u16();
                    last_error = SaveError::Server {
                        status,
                        message: response.text().await.unwrap_or_default(),
                    };
                }
                Ok(response) => return Ok(response),
                Err(e) => last_error = SaveError::Network(e.to_string()),
            }
        }
        Err(last_error)
    }
}

#[async_trait]
impl SaveBackend for ApiClient {
    async fn save(
        &self,
        resume_id: Uuid,
        request: &SaveResumeRequest,
    ) -> Result<SaveResumeResponse, SaveError> {
        let response = self
            .client
            .patch(self.resume_url(resume_id))
            .json(request)
            .send()
            .await
            .map_err(|e| SaveError::Network(e.to_string()))?;
        let response = check_status(resume_id, response).await?;
        let ack: SaveResumeResponse = response
            .json()
            .await
            .map_err(|e| SaveError::Network(e.to_string()))?;
        debug!("server acknowledged resume {resume_id} at {}", ack.revision);
        Ok(ack)
    }

    async fn fetch(&self, resume_id: Uuid) -> Result<ResumeRecord, SaveError> {
        let url = self.resume_url(resume_id);
        let response = self.get_with_retry(|| self.client.get(&url)).await?;
        let response = check_status(resume_id, response).await?;
        response
            .json()
            .await
            .map_err(|e| SaveError::Network(e.to_string()))
    }
}

/// Maps non-2xx responses onto `SaveError`.
async fn check_status(id: Uuid, response: Response) -> Result<Response, SaveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(SaveError::NotFound(id));
    }

    let body = response.text().await.unwrap_or_default();
    let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
    if status == StatusCode::CONFLICT {
        if let Some(current) = envelope.as_ref().and_then(|e| e.current_revision.clone()) {
            return Err(SaveError::Conflict { current });
        }
    }
    Err(SaveError::Server {
        status: status.as_u16(),
        message: envelope.map(|e| e.error.message).unwrap_or(body),
    })
}

fn query_value<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}
