/// Folder in the media store that holds every gallery image
pub const GALLERY_FOLDER: &str = "ImageUploader";

/// Maximum number of images returned by a gallery listing
pub const MAX_LIST_RESULTS: usize = 30;

/// Maximum accepted image size in bytes (5MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// MIME types accepted by the server
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/jpg",
];

/// MIME types the client offers for selection
pub const CLIENT_ALLOWED_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Formats the media store is told to accept
pub const STORE_ALLOWED_FORMATS: &[&str] = &["jpg", "png", "jpeg", "gif", "webp"];

/// Multipart field name used by the client when submitting an image
pub const UPLOAD_FIELD_NAME: &str = "image";

/// Path of the upload/list endpoint
pub const UPLOAD_PATH: &str = "/api/upload";
