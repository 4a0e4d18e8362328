use axum::http::{Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::core::config::AppConfig;
use crate::core::error::{AppError, Result};
use crate::features::images::dtos::{ImageRecordDto, UploadResponseDto};
use crate::features::images::{multipart, validation};
use crate::modules::media_store::{ListQuery, MediaStore};
use crate::shared::constants::GALLERY_FOLDER;
use crate::shared::types::{EndpointRequest, EndpointResponse};

const UPLOAD_FAILED: &str = "Upload failed";
const LIST_FAILED: &str = "Error fetching images";

/// Upload and list endpoint logic, shared by every deployment adapter.
///
/// Holds no per-request state; one instance serves all requests concurrently.
pub struct ImageService {
    store: Arc<dyn MediaStore>,
    folder: String,
    max_request_body_size: usize,
    expose_error_details: bool,
}

impl ImageService {
    pub fn new(store: Arc<dyn MediaStore>, app: &AppConfig) -> Self {
        Self {
            store,
            folder: GALLERY_FOLDER.to_string(),
            max_request_body_size: app.max_request_body_size,
            expose_error_details: app.expose_error_details(),
        }
    }

    /// Dispatch one request to the list or upload operation.
    ///
    /// Never fails: every error is turned into a JSON error response here.
    pub async fn handle(&self, request: EndpointRequest) -> EndpointResponse {
        match request.method {
            Method::GET => match self.list_images().await {
                Ok(images) => EndpointResponse::json(StatusCode::OK, &images),
                Err(e) => EndpointResponse::from_error(&e, LIST_FAILED, self.expose_error_details),
            },
            Method::POST => {
                match self
                    .upload_image(request.content_type.as_deref(), &request.body)
                    .await
                {
                    Ok(uploaded) => EndpointResponse::json(StatusCode::OK, &uploaded),
                    Err(e) => {
                        EndpointResponse::from_error(&e, UPLOAD_FAILED, self.expose_error_details)
                    }
                }
            }
            _ => self.error_response(&AppError::MethodNotAllowed),
        }
    }

    /// Render an error raised outside `handle`, e.g. by an adapter
    pub fn error_response(&self, err: &AppError) -> EndpointResponse {
        EndpointResponse::from_error(err, UPLOAD_FAILED, self.expose_error_details)
    }

    /// Decode, validate and store one image
    ///
    /// # Arguments
    /// * `content_type` - The request's Content-Type header
    /// * `body` - The raw multipart body
    pub async fn upload_image(
        &self,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<UploadResponseDto> {
        validation::check_body_size(body.len(), self.max_request_body_size)?;

        let file = multipart::decode(body, content_type)?;
        validation::validate(&file)?;

        debug!(
            "Accepted upload '{}' ({} bytes, {})",
            file.filename, file.size, file.declared_content_type
        );

        let stored = self
            .store
            .store(&file.bytes, &file.declared_content_type, &self.folder)
            .await?;

        let uploaded = UploadResponseDto::from(stored);
        uploaded.validate().map_err(|e| {
            AppError::StoreUnavailable(format!("Media store returned an unusable result: {}", e))
        })?;

        info!(
            "Image uploaded: public_id={}, format={}, size={}",
            uploaded.public_id, uploaded.format, file.size
        );

        Ok(uploaded)
    }

    /// List the newest gallery images
    pub async fn list_images(&self) -> Result<Vec<ImageRecordDto>> {
        let query = ListQuery::new(&self.folder);
        let records = self.store.list(&query).await?;

        let images: Vec<ImageRecordDto> = records
            .into_iter()
            .take(query.limit())
            .map(ImageRecordDto::from)
            .filter(|image| match image.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Skipping image '{}' without usable URL: {}", image.public_id, e);
                    false
                }
            })
            .collect();

        debug!("Listed {} images from folder '{}'", images.len(), self.folder);

        Ok(images)
    }
}
