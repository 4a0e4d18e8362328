use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::modules::media_store::{
    ImageRecord, ListQuery, MediaStore, SortOrder, StoredImage,
};

/// Failure the in-memory store should report instead of doing its job
#[derive(Debug, Clone)]
pub enum StoreFailure {
    Unavailable(String),
    Rejected(String),
}

/// `MediaStore` fake that keeps images in memory
#[derive(Default)]
pub struct InMemoryMediaStore {
    images: Mutex<Vec<ImageRecord>>,
    failure: Option<StoreFailure>,
    store_calls: AtomicUsize,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failure: StoreFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Pre-populate `folder` with `count` images, one minute apart, oldest first
    pub fn with_images(self, folder: &str, count: usize) -> Self {
        {
            let mut images = self.images.lock().unwrap();
            for i in 0..count {
                images.push(ImageRecord {
                    id: format!("{}/seed-{:03}", folder, i),
                    url: format!("https://media.test/{}/seed-{:03}.png", folder, i),
                    created_at: base_time() + Duration::minutes(i as i64),
                });
            }
        }
        self
    }

    /// Insert a record as is, e.g. one without a URL
    pub fn with_record(self, record: ImageRecord) -> Self {
        self.images.lock().unwrap().push(record);
        self
    }

    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), AppError> {
        match &self.failure {
            Some(StoreFailure::Unavailable(msg)) => Err(AppError::StoreUnavailable(msg.clone())),
            Some(StoreFailure::Rejected(msg)) => Err(AppError::UploadRejectedByStore(msg.clone())),
            None => Ok(()),
        }
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn store(
        &self,
        _bytes: &[u8],
        content_type: &str,
        folder: &str,
    ) -> Result<StoredImage, AppError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let format = content_type
            .strip_prefix("image/")
            .map(|f| if f == "jpeg" { "jpg" } else { f })
            .unwrap_or("bin")
            .to_string();
        let id = format!("{}/{}", folder, Uuid::new_v4().simple());
        let url = format!("https://media.test/{}.{}", id, format);

        let mut images = self.images.lock().unwrap();
        let created_at = images
            .iter()
            .map(|image| image.created_at)
            .max()
            .map(|latest| latest + Duration::seconds(1))
            .unwrap_or_else(base_time);
        images.push(ImageRecord {
            id: id.clone(),
            url: url.clone(),
            created_at,
        });

        Ok(StoredImage { url, id, format })
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ImageRecord>, AppError> {
        self.check_failure()?;

        let prefix = format!("{}/", query.folder);
        let mut images: Vec<ImageRecord> = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|image| image.id.starts_with(&prefix))
            .cloned()
            .collect();

        images.sort_by_key(|image| image.created_at);
        if query.order == SortOrder::Desc {
            images.reverse();
        }
        images.truncate(query.limit());

        Ok(images)
    }
}

/// Builds `multipart/form-data` bodies the way browsers send them
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "----ImageUploaderBoundary7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Close the body and return `(content_type_header, body)`
    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

/// Fake image payload of `size` bytes that starts with a PNG signature
pub fn png_bytes(size: usize) -> Vec<u8> {
    let signature = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    signature
        .iter()
        .copied()
        .chain((0..=255u8).cycle())
        .take(size)
        .collect()
}
