//! Cloudinary media store client
//!
//! Uploads go through the signed Upload API, listings through the Search API.
//! No retries are attempted; a failed request is reported to the caller as is.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::prelude::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use tracing::{debug, info};

use super::{ImageRecord, ListQuery, MediaStore, StoredImage};
use crate::core::config::{CloudinaryConfig, SignatureAlgorithm};
use crate::core::error::AppError;
use crate::shared::constants::STORE_ALLOWED_FORMATS;

/// Cloudinary REST client
pub struct CloudinaryClient {
    http_client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base_url: String,
    signature_algorithm: SignatureAlgorithm,
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    file: String,
    folder: &'a str,
    allowed_formats: String,
    timestamp: i64,
    api_key: &'a str,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<SearchResource>,
}

#[derive(Debug, Deserialize)]
struct SearchResource {
    public_id: String,
    #[serde(default)]
    secure_url: String,
    created_at: DateTime<Utc>,
}

/// Error envelope returned by Cloudinary on failed requests
#[derive(Debug, Deserialize)]
struct VendorErrorResponse {
    error: VendorError,
}

#[derive(Debug, Deserialize)]
struct VendorError {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Cloudinary client initialized for cloud: {}, api: {}",
            config.cloud_name, config.api_base_url
        );

        Ok(Self {
            http_client,
            cloud_name: config.cloud_name,
            api_key: config.api_key,
            api_secret: config.api_secret,
            api_base_url: config.api_base_url,
            signature_algorithm: config.signature_algorithm,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.cloud_name,
            path
        )
    }

    /// Sign request parameters
    ///
    /// Parameters are sorted by name and joined as `key=value&key=value`, the API secret
    /// is appended and the result is digested and hex encoded.
    pub fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        let payload = format!("{}{}", to_sign, self.api_secret);

        match self.signature_algorithm {
            SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
            SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
        }
    }

    /// Turn a non-success response into an error, keeping the vendor's message
    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<VendorErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {} - {}", status, body));

        if status.is_server_error() {
            AppError::StoreUnavailable(message)
        } else {
            AppError::UploadRejectedByStore(message)
        }
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn store(
        &self,
        bytes: &[u8],
        content_type: &str,
        folder: &str,
    ) -> Result<StoredImage, AppError> {
        let timestamp = Utc::now().timestamp();
        let allowed_formats = STORE_ALLOWED_FORMATS.join(",");

        let mut params = BTreeMap::new();
        params.insert("allowed_formats", allowed_formats.clone());
        params.insert("folder", folder.to_string());
        params.insert("timestamp", timestamp.to_string());
        let signature = self.sign(&params);

        let request = UploadRequest {
            file: format!("data:{};base64,{}", content_type, BASE64_STANDARD.encode(bytes)),
            folder,
            allowed_formats,
            timestamp,
            api_key: &self.api_key,
            signature,
        };

        let response = self
            .http_client
            .post(self.endpoint("auto/upload"))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to reach media store: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            AppError::StoreUnavailable(format!("Invalid upload response from media store: {}", e))
        })?;

        debug!(
            "Stored image '{}' ({} bytes, {})",
            uploaded.public_id,
            bytes.len(),
            content_type
        );

        Ok(StoredImage {
            url: uploaded.secure_url,
            id: uploaded.public_id,
            format: uploaded.format.unwrap_or_default(),
        })
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ImageRecord>, AppError> {
        let mut sort_by = serde_json::Map::new();
        sort_by.insert(
            query.sort_field.as_str().to_string(),
            json!(query.order.as_str()),
        );

        let body = json!({
            "expression": format!("folder:{}", query.folder),
            "sort_by": [sort_by],
            "max_results": query.limit(),
        });

        let response = self
            .http_client
            .post(self.endpoint("resources/search"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to reach media store: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let search: SearchResponse = response.json().await.map_err(|e| {
            AppError::StoreUnavailable(format!("Invalid search response from media store: {}", e))
        })?;

        debug!(
            "Listed {} images in folder '{}'",
            search.resources.len(),
            query.folder
        );

        Ok(search
            .resources
            .into_iter()
            .map(|resource| ImageRecord {
                id: resource.public_id,
                url: resource.secure_url,
                created_at: resource.created_at,
            })
            .collect())
    }
}
