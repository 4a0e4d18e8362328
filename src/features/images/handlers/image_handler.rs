use axum::{
    extract::State,
    http::{header, HeaderMap, Method},
};
use std::sync::Arc;

use crate::core::error::ErrorBody;
use crate::core::extractor::RawBody;
use crate::features::images::dtos::{ImageRecordDto, UploadImageDto, UploadResponseDto};
use crate::features::images::services::ImageService;
use crate::shared::types::{EndpointRequest, EndpointResponse};

/// List gallery images
///
/// Returns at most 30 images from the gallery folder, newest first.
#[utoipa::path(
    get,
    path = "/api/upload",
    tag = "images",
    responses(
        (status = 200, description = "Gallery images, newest first", body = Vec<ImageRecordDto>),
        (status = 500, description = "Media store unavailable", body = ErrorBody)
    )
)]
pub async fn list_images(State(service): State<Arc<ImageService>>) -> EndpointResponse {
    service.handle(EndpointRequest::new(Method::GET)).await
}

/// Upload an image
///
/// Accepts multipart/form-data with a single file field named `image`.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "images",
    request_body(
        content = UploadImageDto,
        content_type = "multipart/form-data",
        description = "Image file (JPG, PNG, GIF or WebP, at most 5MB)",
    ),
    responses(
        (status = 200, description = "Image stored", body = UploadResponseDto),
        (status = 400, description = "Missing, malformed, oversized or unsupported file", body = ErrorBody),
        (status = 500, description = "Media store rejected the image or is unavailable", body = ErrorBody)
    )
)]
pub async fn upload_image(
    State(service): State<Arc<ImageService>>,
    headers: HeaderMap,
    RawBody(body): RawBody,
) -> EndpointResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    service
        .handle(EndpointRequest::new(Method::POST).with_body(content_type, body))
        .await
}

/// Any other method on the upload path
pub async fn method_not_allowed(
    State(service): State<Arc<ImageService>>,
    method: Method,
) -> EndpointResponse {
    service.handle(EndpointRequest::new(method)).await
}
