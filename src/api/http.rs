use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use super::{
    detail_from_body, ApiError, ApiResult, AssetRef, HealthStatus, ImageApi, ProcessRequest,
    ProcessedAsset, UploadFile, UploadedAsset,
};

const UPLOAD_ENDPOINT: &str = "upload";
const DOWNLOAD_ENDPOINT: &str = "download/";

/// [`ImageApi`] over HTTP. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpImageApi {
    client: Client,
    base_url: Url,
}

impl HttpImageApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::InvalidUrl {
                url: path.to_string(),
                message: err.to_string(),
            })
    }

    fn asset_url(&self, image_url: &str) -> ApiResult<Url> {
        match Url::parse(image_url) {
            Ok(url) => Ok(url),
            Err(_) => self.endpoint_url(image_url),
        }
    }

    fn download_url(&self, asset: &AssetRef) -> ApiResult<Url> {
        let mut url = self.endpoint_url(DOWNLOAD_ENDPOINT)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                url: self.base_url.to_string(),
                message: "base url cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(asset.as_str());
        Ok(url)
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> ApiResult<Response> {
        tracing::debug!(endpoint, "sending api request");
        let response = request.send().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        let detail = detail_from_body(status.as_u16(), &body);
        tracing::warn!(endpoint, status = status.as_u16(), %detail, "api request rejected");
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn read_bytes(&self, endpoint: &str, response: Response) -> ApiResult<Vec<u8>> {
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: Response,
    ) -> ApiResult<T> {
        let body = self.read_bytes(endpoint, response).await?;
        serde_json::from_slice(&body).map_err(|err| ApiError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        })
    }
}

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|err| ApiError::InvalidUrl {
        url: raw.to_string(),
        message: err.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl ImageApi for HttpImageApi {
    async fn health(&self) -> ApiResult<HealthStatus> {
        let url = self.base_url.clone();
        let response = self.send("/", self.client.get(url)).await?;
        self.read_json("/", response).await
    }

    async fn upload(&self, file: &UploadFile) -> ApiResult<UploadedAsset> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|err| ApiError::InvalidRequest {
                endpoint: UPLOAD_ENDPOINT.to_string(),
                message: err.to_string(),
            })?;
        let form = Form::new().part("file", part);
        let url = self.endpoint_url(UPLOAD_ENDPOINT)?;
        let response = self
            .send(UPLOAD_ENDPOINT, self.client.post(url).multipart(form))
            .await?;
        let uploaded: UploadedAsset = self.read_json(UPLOAD_ENDPOINT, response).await?;
        tracing::info!(asset = %uploaded.filename, "image uploaded");
        Ok(uploaded)
    }

    async fn process(&self, request: &ProcessRequest) -> ApiResult<ProcessedAsset> {
        let endpoint = request.endpoint();
        let url = self.endpoint_url(endpoint)?;
        let fields = request.form_fields();
        let response = self
            .send(endpoint, self.client.post(url).form(&fields))
            .await?;
        let processed: ProcessedAsset = self.read_json(endpoint, response).await?;
        tracing::info!(endpoint, asset = %processed.filename, "image processed");
        Ok(processed)
    }

    async fn fetch_asset(&self, image_url: &str) -> ApiResult<Vec<u8>> {
        let url = self.asset_url(image_url)?;
        let response = self.send(image_url, self.client.get(url)).await?;
        self.read_bytes(image_url, response).await
    }

    async fn download(&self, asset: &AssetRef) -> ApiResult<Vec<u8>> {
        let url = self.download_url(asset)?;
        let response = self.send(DOWNLOAD_ENDPOINT, self.client.get(url)).await?;
        self.read_bytes(DOWNLOAD_ENDPOINT, response).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::api::ScaleFactor;
    use crate::geometry::SourceRegion;

    /// Answers a single request with a canned response and returns the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("client should connect");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                let read = stream.read(&mut buf).await.expect("request should be readable");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("response should be written");
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), server)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + length
    }

    fn api(base: &str) -> HttpImageApi {
        HttpImageApi::new(base, Duration::from_secs(5)).expect("client should build")
    }

    #[test]
    fn endpoint_urls_resolve_against_base_path() {
        let api = api("http://localhost:8000/api");
        assert_eq!(api.base_url().as_str(), "http://localhost:8000/api/");
        let url = api.endpoint_url("remove-bg").expect("url should resolve");
        assert_eq!(url.as_str(), "http://localhost:8000/api/remove-bg");
    }

    #[test]
    fn relative_image_urls_join_base() {
        let api = api("http://localhost:8000");
        let url = api
            .asset_url("/processed/cropped_1.png")
            .expect("url should resolve");
        assert_eq!(url.as_str(), "http://localhost:8000/processed/cropped_1.png");
        let absolute = api
            .asset_url("https://cdn.example.com/a.png")
            .expect("absolute url should parse");
        assert_eq!(absolute.as_str(), "https://cdn.example.com/a.png");
    }

    #[test]
    fn download_url_escapes_filename() {
        let api = api("http://localhost:8000");
        let url = api
            .download_url(&AssetRef::new("my file.png"))
            .expect("url should resolve");
        assert_eq!(url.as_str(), "http://localhost:8000/download/my%20file.png");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpImageApi::new("not a url", Duration::from_secs(1))
            .expect_err("invalid url should fail");
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn rejected_request_surfaces_server_detail() {
        let (base, server) =
            serve_once("400 Bad Request", r#"{"detail":"Invalid crop dimensions"}"#).await;
        let request = ProcessRequest::Crop {
            asset: AssetRef::new("a.png"),
            region: SourceRegion::new(0, 0, 10, 10),
        };
        let err = api(&base)
            .process(&request)
            .await
            .expect_err("server rejection should fail");
        assert!(matches!(
            &err,
            ApiError::Status { status: 400, detail } if detail == "Invalid crop dimensions"
        ));
        assert_eq!(err.to_string(), "Invalid crop dimensions");

        let raw = server.await.expect("server task should finish");
        assert!(raw.starts_with("POST /crop "));
        assert!(raw.contains("filename=a.png"));
    }

    #[tokio::test]
    async fn successful_process_parses_camel_case_body() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"filename":"b.png","imageUrl":"/processed/b.png","width":20,"height":10}"#,
        )
        .await;
        let request = ProcessRequest::Upscale {
            asset: AssetRef::new("a.png"),
            scale: ScaleFactor::X2,
        };
        let processed = api(&base)
            .process(&request)
            .await
            .expect("process should succeed");
        assert_eq!(processed.filename, AssetRef::new("b.png"));
        assert_eq!(processed.image_url, "/processed/b.png");
        assert_eq!((processed.width, processed.height), (Some(20), Some(10)));

        let raw = server.await.expect("server task should finish");
        assert!(raw.starts_with("POST /upscale "));
        assert!(raw.contains("scale=2"));
    }
}
