use utoipa::{Modify, OpenApi};

use crate::core::error::ErrorBody;
use crate::features::images::{dtos as images_dtos, handlers as images_handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Images
        images_handlers::list_images,
        images_handlers::upload_image,
    ),
    components(
        schemas(
            ErrorBody,
            images_dtos::UploadImageDto,
            images_dtos::UploadResponseDto,
            images_dtos::ImageRecordDto,
        )
    ),
    tags(
        (name = "images", description = "Image upload and gallery listing"),
    ),
    info(
        title = "Image Uploader API",
        version = "0.1.0",
        description = "Upload images and browse the gallery",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
