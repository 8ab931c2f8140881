//! Async client for the fleet service HTTP surface.
//!
//! Seven endpoints, all request/response; nothing below the HTTP boundary
//! is interpreted here. Non-2xx responses become [`ApiError::Http`] with
//! the response body carried as opaque error text.

use std::time::Duration;

use api_types::{
    CreatePodRequest, DeletePodRequest, ScanStartResponse, ScanStatusResponse, Server,
    UpdatePodRequest,
};
use error_stack::{Report, ResultExt};
use tracing::debug;
use url::Url;

use crate::api::error::{ApiError, ApiResult};

/// Deployment-time client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// base url of the fleet service
    pub base_url: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// create a new config with default parameters.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// HTTP client for the fleet service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// create client
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let base = Url::parse(&config.base_url).change_context(ApiError::Configuration {
            message: format!("Invalid base URL: {}", config.base_url),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .change_context(ApiError::Configuration {
                message: "Failed to create HTTP client".into(),
            })?;

        Ok(Self { base, http })
    }

    /// Fetch the complete list of servers with nested pods.
    pub async fn list_servers(&self) -> ApiResult<Vec<Server>> {
        let response = self
            .http
            .get(self.endpoint("/servers")?)
            .send()
            .await
            .change_context(ApiError::Network {
                message: "list servers request failed".into(),
            })?;
        let response = check_status(response).await?;

        let servers: Vec<Server> =
            response
                .json()
                .await
                .change_context(ApiError::Serialization {
                    message: "Failed to deserialize server list".into(),
                })?;
        debug!(servers = servers.len(), "server list fetched");
        Ok(servers)
    }

    /// Submit a new pod spec.
    pub async fn create_pod(&self, request: &CreatePodRequest) -> ApiResult<()> {
        let response = self
            .http
            .post(self.endpoint("/create")?)
            .json(request)
            .send()
            .await
            .change_context(ApiError::Network {
                message: "create pod request failed".into(),
            })?;
        check_status(response).await?;
        Ok(())
    }

    /// Submit a target image for an existing pod. The service may take tens
    /// of seconds to answer while it rolls the workload over.
    pub async fn update_pod(&self, request: &UpdatePodRequest) -> ApiResult<()> {
        let response = self
            .http
            .post(self.endpoint("/update")?)
            .json(request)
            .send()
            .await
            .change_context(ApiError::Network {
                message: "update pod request failed".into(),
            })?;
        check_status(response).await?;
        Ok(())
    }

    /// Remove a pod by identity. Absence from the next snapshot is the only
    /// deletion confirmation.
    pub async fn delete_pod(&self, request: &DeletePodRequest) -> ApiResult<()> {
        let response = self
            .http
            .post(self.endpoint("/delete")?)
            .json(request)
            .send()
            .await
            .change_context(ApiError::Network {
                message: "delete pod request failed".into(),
            })?;
        check_status(response).await?;
        Ok(())
    }

    /// Fetch the complete current log content for a pod.
    pub async fn fetch_logs(&self, server_id: &str, pod_id: &str) -> ApiResult<String> {
        let response = self
            .http
            .get(self.endpoint("/logs")?)
            .query(&[("server_id", server_id), ("pod_id", pod_id)])
            .send()
            .await
            .change_context(ApiError::Network {
                message: "log fetch request failed".into(),
            })?;
        let response = check_status(response).await?;

        response.text().await.change_context(ApiError::Network {
            message: "Failed to read log body".into(),
        })
    }

    /// Start a security scan for a pod's image.
    pub async fn start_scan(&self, server_id: &str, pod_id: &str) -> ApiResult<ScanStartResponse> {
        let response = self
            .http
            .get(self.endpoint("/scan")?)
            .query(&[("server_id", server_id), ("pod_id", pod_id)])
            .send()
            .await
            .change_context(ApiError::Network {
                message: "scan start request failed".into(),
            })?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .change_context(ApiError::Serialization {
                message: "Failed to deserialize scan start response".into(),
            })
    }

    /// Poll the status of a running scan.
    pub async fn scan_status(&self, scan_id: &str) -> ApiResult<ScanStatusResponse> {
        let response = self
            .http
            .get(self.endpoint("/scan/status")?)
            .query(&[("scan_id", scan_id)])
            .send()
            .await
            .change_context(ApiError::Network {
                message: "scan status request failed".into(),
            })?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .change_context(ApiError::Serialization {
                message: "Failed to deserialize scan status".into(),
            })
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base.join(path).change_context(ApiError::Configuration {
            message: format!("Invalid endpoint path: {path}"),
        })
    }
}

/// Pass 2xx responses through; everything else becomes an [`ApiError::Http`]
/// carrying the body as the service's opaque error text.
async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(Report::new(ApiError::Http {
        status: status.as_u16(),
        message,
    }))
}
