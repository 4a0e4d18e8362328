//! Upload form state machine
//!
//! `Idle -> FileSelected -> Submitting -> {Success, Failed}`. The current state is
//! published on a `watch` channel so a renderer can follow along without holding the form.

use base64::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::client::api::{ClientError, UploadApi};
use crate::client::events::{ImageUploaded, UploadNotifier};
use crate::core::error::{AppError, Result};
use crate::features::images::dtos::UploadResponseDto;
use crate::features::images::validation::validate_candidate;

pub const NO_FILE_MESSAGE: &str = "Please select an image to upload";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";
pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_secs(2);

/// A file picked by the user, not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its media type from the extension
    pub async fn from_path(path: &Path) -> std::result::Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(name, content_type, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    FileSelected,
    Submitting,
    Success(UploadResponseDto),
    Failed(String),
}

pub struct UploadForm {
    api: Arc<dyn UploadApi>,
    notifier: UploadNotifier,
    success_delay: Duration,
    state: watch::Sender<FormState>,
    selected: Option<SelectedFile>,
    preview: Option<String>,
    error: Option<String>,
}

impl UploadForm {
    pub fn new(api: Arc<dyn UploadApi>, notifier: UploadNotifier) -> Self {
        let (state, _) = watch::channel(FormState::Idle);
        Self {
            api,
            notifier,
            success_delay: DEFAULT_SUCCESS_DELAY,
            state,
            selected: None,
            preview: None,
            error: None,
        }
    }

    /// How long the success state is shown before the form resets
    pub fn with_success_delay(mut self, delay: Duration) -> Self {
        self.success_delay = delay;
        self
    }

    #[allow(dead_code)]
    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    #[allow(dead_code)]
    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    /// `data:` URL of the selected file
    #[allow(dead_code)]
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// Inline error text, if any
    #[allow(dead_code)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[allow(dead_code)]
    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && *self.state.borrow() != FormState::Submitting
    }

    /// Validate and keep a candidate file. A rejected candidate leaves the
    /// previous selection in place.
    pub async fn select_file(&mut self, candidate: SelectedFile) -> Result<()> {
        self.error = None;

        if let Err(e) = validate_candidate(&candidate.content_type, candidate.size()) {
            self.error = Some(e.to_string());
            return Err(e);
        }

        let preview = render_preview(&candidate).await?;

        tracing::debug!("Selected {} ({} bytes)", candidate.name, candidate.size());
        self.selected = Some(candidate);
        self.preview = Some(preview);
        self.state.send_replace(FormState::FileSelected);
        Ok(())
    }

    /// Upload the selected file. Returns the state the form settled in.
    pub async fn submit(&mut self) -> FormState {
        let Some(file) = self.selected.clone() else {
            self.error = Some(NO_FILE_MESSAGE.to_string());
            return self.state();
        };

        self.error = None;
        self.state.send_replace(FormState::Submitting);

        match self.api.upload(&file).await {
            Ok(uploaded) => {
                tracing::info!("Uploaded {} as {}", file.name, uploaded.public_id);
                self.state.send_replace(FormState::Success(uploaded.clone()));

                tokio::time::sleep(self.success_delay).await;

                self.selected = None;
                self.preview = None;
                self.state.send_replace(FormState::Idle);
                self.notifier.notify(ImageUploaded {
                    public_id: uploaded.public_id,
                    url: uploaded.url,
                });
            }
            Err(e) => {
                tracing::warn!("Upload of {} failed: {}", file.name, e);
                let message = e
                    .server_message()
                    .unwrap_or(UPLOAD_FAILED_MESSAGE)
                    .to_string();
                self.error = Some(message.clone());
                self.state.send_replace(FormState::Failed(message));
            }
        }

        self.state()
    }
}

async fn render_preview(file: &SelectedFile) -> Result<String> {
    let content_type = file.content_type.clone();
    let bytes = Arc::clone(&file.bytes);

    tokio::task::spawn_blocking(move || {
        format!(
            "data:{};base64,{}",
            content_type,
            BASE64_STANDARD.encode(&bytes)
        )
    })
    .await
    .map_err(|e| AppError::Internal(format!("Preview rendering failed: {}", e)))
}
