use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::media_store::{ImageRecord, StoredImage};

/// Upload image request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler decodes the raw multipart body itself.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadImageDto {
    /// The image to upload (JPG, PNG, GIF or WebP, at most 5MB)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

/// Response DTO for a successful upload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, PartialEq, Eq)]
pub struct UploadResponseDto {
    /// Public URL of the stored image
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
    /// Identifier assigned by the media store, prefixed with the gallery folder
    #[schema(example = "ImageUploader/kq3vz1x8d0")]
    pub public_id: String,
    /// Format detected by the media store
    #[schema(example = "png")]
    pub format: String,
}

/// One gallery entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, PartialEq, Eq)]
pub struct ImageRecordDto {
    /// Identifier assigned by the media store
    pub public_id: String,
    /// Public URL of the image
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
    /// Upload timestamp (ISO-8601)
    pub created_at: DateTime<Utc>,
}

impl From<StoredImage> for UploadResponseDto {
    fn from(stored: StoredImage) -> Self {
        Self {
            url: stored.url,
            public_id: stored.id,
            format: stored.format,
        }
    }
}

impl From<ImageRecord> for ImageRecordDto {
    fn from(record: ImageRecord) -> Self {
        Self {
            public_id: record.id,
            url: record.url,
            created_at: record.created_at,
        }
    }
}
