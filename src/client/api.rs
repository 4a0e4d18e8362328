use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::client::form::SelectedFile;
use crate::core::error::ErrorBody;
use crate::features::images::dtos::{ImageRecordDto, UploadResponseDto};
use crate::shared::constants::{UPLOAD_FIELD_NAME, UPLOAD_PATH};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint answered with a non-success status
    #[error("Request rejected with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Error text sent back by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// The two calls the client makes against the upload endpoint
#[async_trait]
pub trait UploadApi: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponseDto, ClientError>;

    async fn list(&self) -> Result<Vec<ImageRecordDto>, ClientError>;
}

/// HTTP implementation of [`UploadApi`]
pub struct HttpUploadApi {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpUploadApi {
    pub fn new(api_url: &str) -> Self {
        Self {
            endpoint: format!("{}{}", api_url.trim_end_matches('/'), UPLOAD_PATH),
            http_client: reqwest::Client::new(),
        }
    }

    async fn rejection(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .map(|error| error.error);

        tracing::warn!("Upload endpoint returned HTTP {}: {}", status, body);
        ClientError::Rejected { status, message }
    }
}

#[async_trait]
impl UploadApi for HttpUploadApi {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponseDto, ClientError> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        tracing::debug!("Uploading {} ({} bytes)", file.name, file.size());

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(response.json::<UploadResponseDto>().await?)
    }

    async fn list(&self) -> Result<Vec<ImageRecordDto>, ClientError> {
        let response = self.http_client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(response.json::<Vec<ImageRecordDto>>().await?)
    }
}
