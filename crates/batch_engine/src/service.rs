use std::time::Duration;

use bytes::Bytes;
use engine_logging::engine_debug;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::{ConversionError, TransportKind, UploadItem};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_artifact_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Body returned by the conversion endpoint, on success and on failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ServiceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, alias = "outputFilename")]
    pub output_filename: Option<String>,
    #[serde(default, alias = "textContent")]
    pub text_content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait::async_trait]
pub trait ConversionService: Send + Sync {
    /// Submit one file. `Ok` means the service answered with a readable body
    /// and a success status; the body's own `success` flag is not checked here.
    async fn convert(
        &self,
        item: &UploadItem,
        target_format: &str,
    ) -> Result<ServiceResponse, ConversionError>;

    /// Retrieval location for an artifact the service reported.
    fn artifact_location(&self, filename: &str) -> String;

    async fn fetch_artifact(&self, filename: &str) -> Result<Bytes, ConversionError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestConversionService {
    settings: ServiceSettings,
    client: reqwest::Client,
}

impl ReqwestConversionService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ConversionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ConversionError::transport(TransportKind::Other, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl ConversionService for ReqwestConversionService {
    async fn convert(
        &self,
        item: &UploadItem,
        target_format: &str,
    ) -> Result<ServiceResponse, ConversionError> {
        let form = Form::new()
            .part("file", file_part(item))
            .text("target_format", target_format.to_string());

        let response = self
            .client
            .post(self.endpoint("convert"))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed = serde_json::from_slice::<ServiceResponse>(&body);
        engine_debug!(
            "convert '{}' answered {} ({} bytes)",
            item.name,
            status,
            body.len()
        );

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|response| response.error)
                .filter(|message| !message.trim().is_empty())
                .or_else(|| status.canonical_reason().map(str::to_string));
            return Err(ConversionError::service(Some(status.as_u16()), message));
        }

        parsed.map_err(|err| {
            ConversionError::service(
                Some(status.as_u16()),
                Some(format!("Invalid response from conversion service: {err}")),
            )
        })
    }

    fn artifact_location(&self, filename: &str) -> String {
        self.endpoint(&format!("download/{filename}"))
    }

    async fn fetch_artifact(&self, filename: &str) -> Result<Bytes, ConversionError> {
        let response = self
            .client
            .get(self.artifact_location(filename))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConversionError::service(
                Some(status.as_u16()),
                status.canonical_reason().map(str::to_string),
            ));
        }

        let max_bytes = self.settings.max_artifact_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ConversionError::service(
                Some(status.as_u16()),
                Some(format!("Artifact exceeds {max_bytes} bytes")),
            ));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ConversionError::service(
                    Some(status.as_u16()),
                    Some(format!("Artifact exceeds {max_bytes} bytes")),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(bytes))
    }
}

fn file_part(item: &UploadItem) -> Part {
    let bare = || Part::bytes(item.content.to_vec()).file_name(item.name.clone());
    bare().mime_str(&item.content_kind).unwrap_or_else(|_| bare())
}

fn map_reqwest_error(err: reqwest::Error) -> ConversionError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_body() || err.is_decode() {
        TransportKind::Body
    } else {
        TransportKind::Other
    };
    ConversionError::transport(kind, err.to_string())
}
