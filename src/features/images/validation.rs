use crate::core::error::{AppError, Result};
use crate::features::images::models::UploadedFile;
use crate::shared::constants::{ALLOWED_MIME_TYPES, CLIENT_ALLOWED_MIME_TYPES, MAX_FILE_SIZE};

pub const FILE_TOO_LARGE_MESSAGE: &str = "File size too large. Maximum size is 5MB";
pub const CLIENT_FILE_TOO_LARGE_MESSAGE: &str = "File is too large. Maximum size is 5MB.";
pub const UNSUPPORTED_TYPE_MESSAGE: &str =
    "Invalid file type. Please upload a JPG, PNG, GIF, or WebP image.";

/// Check if a MIME type is accepted by the server
pub fn is_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

/// Validate a decoded upload. Size is checked before type.
pub fn validate(file: &UploadedFile) -> Result<()> {
    if file.size > MAX_FILE_SIZE {
        return Err(AppError::FileTooLarge(FILE_TOO_LARGE_MESSAGE.to_string()));
    }

    if !is_mime_type_allowed(&file.declared_content_type) {
        return Err(AppError::UnsupportedType(
            UNSUPPORTED_TYPE_MESSAGE.to_string(),
        ));
    }

    Ok(())
}

/// Reject a raw request body that exceeds the request limit before decoding it
pub fn check_body_size(body_len: usize, limit: usize) -> Result<()> {
    if body_len > limit {
        return Err(AppError::FileTooLarge(FILE_TOO_LARGE_MESSAGE.to_string()));
    }
    Ok(())
}

/// Client-side pre-check applied when a file is picked, before anything is sent
pub fn validate_candidate(content_type: &str, size: usize) -> Result<()> {
    if !CLIENT_ALLOWED_MIME_TYPES.contains(&content_type) {
        return Err(AppError::UnsupportedType(
            UNSUPPORTED_TYPE_MESSAGE.to_string(),
        ));
    }

    if size > MAX_FILE_SIZE {
        return Err(AppError::FileTooLarge(
            CLIENT_FILE_TOO_LARGE_MESSAGE.to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn file_of(size: usize, content_type: &str) -> UploadedFile {
        UploadedFile::new(vec![0u8; size], "f".to_string(), content_type.to_string())
    }

    #[test]
    fn test_size_boundary() {
        assert_ok!(validate(&file_of(MAX_FILE_SIZE, "image/png")));

        let err = validate(&file_of(MAX_FILE_SIZE + 1, "image/png")).unwrap_err();
        assert!(matches!(err, AppError::FileTooLarge(_)));
        assert!(err.to_string().contains("5MB"));
    }

    #[test]
    fn test_accepts_every_allowed_type() {
        for content_type in ["image/jpeg", "image/png", "image/gif", "image/webp", "image/jpg"] {
            assert!(
                validate(&file_of(10, content_type)).is_ok(),
                "{} should be accepted",
                content_type
            );
        }
    }

    #[test]
    fn test_rejects_other_types() {
        for content_type in [
            "text/plain",
            "application/pdf",
            "application/octet-stream",
            "image/svg+xml",
            "image/bmp",
            "IMAGE/PNG",
            "",
        ] {
            let err = validate(&file_of(10, content_type)).unwrap_err();
            assert!(
                matches!(err, AppError::UnsupportedType(_)),
                "{} should be rejected",
                content_type
            );
        }
    }

    #[test]
    fn test_size_checked_before_type() {
        let err = validate(&file_of(MAX_FILE_SIZE + 1, "text/plain")).unwrap_err();
        assert!(matches!(err, AppError::FileTooLarge(_)));
    }

    #[test]
    fn test_check_body_size() {
        assert_ok!(check_body_size(100, 100));
        assert_err!(check_body_size(101, 100));
        assert!(matches!(
            check_body_size(101, 100),
            Err(AppError::FileTooLarge(_))
        ));
    }

    #[test]
    fn test_candidate_rules() {
        assert_ok!(validate_candidate("image/webp", MAX_FILE_SIZE));
        // The client does not offer image/jpg
        assert!(matches!(
            validate_candidate("image/jpg", 10),
            Err(AppError::UnsupportedType(_))
        ));
        assert!(matches!(
            validate_candidate("image/png", MAX_FILE_SIZE + 1),
            Err(AppError::FileTooLarge(_))
        ));
    }
}
