/// A single file extracted from a multipart request body.
///
/// Lives only for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub declared_content_type: String,
    pub size: usize,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>, filename: String, declared_content_type: String) -> Self {
        let size = bytes.len();
        Self {
            bytes,
            filename,
            declared_content_type,
            size,
        }
    }
}
