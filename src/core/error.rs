use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MalformedRequest(String),

    #[error("{0}")]
    NoFilePresent(String),

    #[error("{0}")]
    UnsupportedType(String),

    #[error("{0}")]
    FileTooLarge(String),

    #[error("{0}")]
    UploadRejectedByStore(String),

    #[error("{0}")]
    StoreUnavailable(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    /// Internal detail, only present when error details are exposed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedRequest(_)
            | AppError::NoFilePresent(_)
            | AppError::UnsupportedType(_)
            | AppError::FileTooLarge(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UploadRejectedByStore(_)
            | AppError::StoreUnavailable(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable name of the error class, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MalformedRequest(_) => "malformed_request",
            AppError::NoFilePresent(_) => "no_file_present",
            AppError::UnsupportedType(_) => "unsupported_type",
            AppError::FileTooLarge(_) => "file_too_large",
            AppError::UploadRejectedByStore(_) => "upload_rejected_by_store",
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::Internal(_) => "internal",
        }
    }

    /// Render the error as a status and JSON body.
    ///
    /// Client errors always carry their own message. Server errors are logged in full
    /// and only echoed back when `expose_details` is set; otherwise `fallback` is sent.
    pub fn render(&self, fallback: &str, expose_details: bool) -> (StatusCode, ErrorBody) {
        let status = self.status_code();

        if !status.is_server_error() {
            tracing::debug!(kind = self.kind(), "Request rejected: {}", self);
            return (
                status,
                ErrorBody {
                    error: self.to_string(),
                    details: None,
                },
            );
        }

        tracing::error!(kind = self.kind(), "{}: {:?}", fallback, self);

        let body = if expose_details {
            ErrorBody {
                error: self.to_string(),
                details: Some(format!("{:?}", self)),
            }
        } else {
            ErrorBody {
                error: fallback.to_string(),
                details: None,
            }
        };

        (status, body)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
