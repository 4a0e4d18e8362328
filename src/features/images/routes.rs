use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

use crate::features::images::handlers::{list_images, method_not_allowed, upload_image};
use crate::features::images::services::ImageService;
use crate::shared::constants::UPLOAD_PATH;

/// Create routes for the images feature
pub fn routes(image_service: Arc<ImageService>, max_request_body_size: usize) -> Router {
    Router::new()
        .route(
            UPLOAD_PATH,
            get(list_images)
                .post(upload_image)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(max_request_body_size)),
        )
        .with_state(image_service)
}
