//! HTTP implementation of [`BenchmarkService`] against the backend's JSON API.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{BenchmarkService, ServiceError};
use crate::config::ServiceConfig;
use crate::cost::DatasetShape;
use crate::results::RunResults;
use crate::run::types::{StartAck, StartRequest, StatusSnapshot};

/// Benchmark backend reached over HTTP.
///
/// Every request carries an `x-request-id` header and is bounded by the
/// configured request timeout.
#[derive(Debug, Clone)]
pub struct HttpBenchmarkService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBenchmarkService {
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, op: &str) -> Result<Response, ServiceError> {
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(op, request_id = %request_id, "Benchmark service request");

        let response = request
            .header("x-request-id", &request_id)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(op, request_id = %request_id, status = status.as_u16(), "Request rejected");
            return Err(ServiceError::Rejected {
                status: Some(status.as_u16()),
                message: format!("{} ({}): {}", op, status, detail_of(&body)),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, op: &str) -> Result<T, ServiceError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Rejected {
            status: None,
            message: format!("{} returned an unreadable body: {}", op, e),
        })
    }
}

/// FastAPI-style `{"detail": "..."}` bodies are unwrapped; anything else is
/// passed through.
fn detail_of(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl BenchmarkService for HttpBenchmarkService {
    async fn start(&self, request: &StartRequest) -> Result<StartAck, ServiceError> {
        let req = self.client.post(self.url("/benchmark/run")).json(request);
        let response = self.send(req, "start").await?;
        Self::decode(response, "start").await
    }

    async fn status(&self, run_id: &str) -> Result<StatusSnapshot, ServiceError> {
        let req = self
            .client
            .get(self.url(&format!("/benchmark/status/{}", run_id)));
        let response = self.send(req, "status").await?;
        Self::decode(response, "status").await
    }

    async fn cancel(&self, run_id: &str) -> Result<(), ServiceError> {
        let req = self
            .client
            .post(self.url(&format!("/benchmark/cancel/{}", run_id)));
        self.send(req, "cancel").await?;
        Ok(())
    }

    async fn results(&self, run_id: &str) -> Result<RunResults, ServiceError> {
        let req = self.client.get(self.url(&format!("/results/{}", run_id)));
        let response = self.send(req, "results").await?;
        Self::decode(response, "results").await
    }

    async fn dataset(&self, dataset_id: &str) -> Result<DatasetShape, ServiceError> {
        let req = self.client.get(self.url(&format!("/datasets/{}", dataset_id)));
        let response = self.send(req, "dataset").await?;
        Self::decode(response, "dataset").await
    }
}
