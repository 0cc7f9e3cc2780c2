//! HTTP access to the document service.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::api::types::{DashboardSnapshot, HealthStatus, SummarizeResponse, Task, UploadResponse};
use crate::config::{ClientConfig, CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::sync::upload::UploadFile;

/// Operations the sync layer needs from the document service.
///
/// The controller only talks to this trait, so tests can substitute an
/// in-memory backend for the HTTP one.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ApiError>;

    async fn task_status(&self, id: &str) -> Result<Task, ApiError>;

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;

    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;

    async fn dashboard(&self) -> Result<DashboardSnapshot, ApiError>;

    async fn summarize(&self, id: &str) -> Result<SummarizeResponse, ApiError>;

    async fn health(&self) -> Result<HealthStatus, ApiError>;
}

/// [`TaskApi`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// `route` followed by `id` as a single percent-encoded path segment.
    fn task_url(&self, route: &str, id: &str) -> Result<Url, ApiError> {
        // The url crate drops "." and ".." segments instead of encoding them.
        if matches!(id, "" | "." | "..") {
            return Err(ApiError::InvalidUrl(format!("'{}' is not a task id", id)));
        }
        let mut url =
            Url::parse(&self.url(route)).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("'{}' cannot be a base", self.base_url)))?
            .push(id);
        Ok(url)
    }

    fn task_request(&self, method: Method, route: &str, id: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.request(method, self.task_url(route, id)?))
    }

    /// Sends the request and returns the raw response once the status is known to be a success.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e, REQUEST_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(endpoint, status.as_u16(), &body));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(endpoint, request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(endpoint, e, REQUEST_TIMEOUT))?;

        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ApiError> {
        let endpoint = "POST /api/upload";
        log::debug!(
            "Uploading '{}' ({}, {} bytes)",
            file.filename,
            file.content_type,
            file.size()
        );

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                message: format!("Invalid content type '{}': {}", file.content_type, e),
            })?;
        let form = Form::new().part("file", part);

        self.send_json(endpoint, self.request(Method::POST, "/api/upload").multipart(form))
            .await
    }

    async fn task_status(&self, id: &str) -> Result<Task, ApiError> {
        let endpoint = format!("GET /api/status/{}", id);
        let request = self.task_request(Method::GET, "/api/status", id)?;
        self.send_json(&endpoint, request).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.send_json("GET /api/results", self.request(Method::GET, "/api/results"))
            .await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let endpoint = format!("DELETE /api/results/{}", id);
        // The body is informational only and may be empty.
        let request = self.task_request(Method::DELETE, "/api/results", id)?;
        self.send(&endpoint, request).await?;
        Ok(())
    }

    async fn dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        self.send_json("GET /api/dashboard", self.request(Method::GET, "/api/dashboard"))
            .await
    }

    async fn summarize(&self, id: &str) -> Result<SummarizeResponse, ApiError> {
        let endpoint = format!("POST /api/summarize/{}", id);
        let request = self.task_request(Method::POST, "/api/summarize", id)?;
        self.send_json(&endpoint, request).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.send_json("GET /api/health", self.request(Method::GET, "/api/health"))
            .await
    }
}
