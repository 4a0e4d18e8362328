//! Media store module
//!
//! Abstracts the external image hosting service behind the `MediaStore` trait
//! and provides the Cloudinary-backed implementation.

mod cloudinary_client;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::error::AppError;
use crate::shared::constants::MAX_LIST_RESULTS;

pub use cloudinary_client::CloudinaryClient;

/// Result of storing one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub id: String,
    pub format: String,
}

/// One image as reported by the store's listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Desc => "desc",
        }
    }
}

/// Listing parameters. Defaults to newest first, capped at `MAX_LIST_RESULTS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub folder: String,
    pub sort_field: SortField,
    pub order: SortOrder,
    limit: usize,
}

impl ListQuery {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            sort_field: SortField::default(),
            order: SortOrder::default(),
            limit: MAX_LIST_RESULTS,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Capability set of the external media store
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store an image under `folder` and return where it can be reached
    async fn store(
        &self,
        bytes: &[u8],
        content_type: &str,
        folder: &str,
    ) -> Result<StoredImage, AppError>;

    /// List images in a folder according to `query`
    async fn list(&self, query: &ListQuery) -> Result<Vec<ImageRecord>, AppError>;
}
