//! Client side of the image processing HTTP API.

mod http;
mod request;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpImageApi;
pub use request::{
    AssetRef, HealthStatus, OutputFormat, ProcessRequest, ProcessedAsset, ResizeMode,
    ScaleFactor, UploadFile, UploadedAsset,
};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response. Displays the server's `detail` message unchanged.
    #[error("{detail}")]
    Status { status: u16, detail: String },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
    #[error("invalid request for {endpoint}: {message}")]
    InvalidRequest { endpoint: String, message: String },
    #[error("invalid API url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations offered by the processing backend.
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn health(&self) -> ApiResult<HealthStatus>;
    async fn upload(&self, file: &UploadFile) -> ApiResult<UploadedAsset>;
    async fn process(&self, request: &ProcessRequest) -> ApiResult<ProcessedAsset>;
    /// Fetches the bytes behind an `imageUrl` returned by a processing call.
    async fn fetch_asset(&self, image_url: &str) -> ApiResult<Vec<u8>>;
    async fn download(&self, asset: &AssetRef) -> ApiResult<Vec<u8>>;
}

/// Extracts the user-facing message from an error response body.
pub(crate) fn detail_from_body(status: u16, body: &[u8]) -> String {
    let fallback = || format!("request failed with status {status}");
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return fallback();
    };
    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Null) | None => fallback(),
        Some(other) => other.to_string(),
    }
}
