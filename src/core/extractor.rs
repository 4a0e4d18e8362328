use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::core::error::AppError;
use crate::features::images::validation::FILE_TOO_LARGE_MESSAGE;
use crate::shared::types::EndpointResponse;

/// Raw request body extractor that rejects with the endpoint's JSON error format
pub struct RawBody(pub Bytes);

impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = RawBodyRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Bytes::from_request(req, state).await {
            Ok(bytes) => Ok(Self(bytes)),
            Err(rejection) => Err(RawBodyRejection(rejection)),
        }
    }
}

pub struct RawBodyRejection(BytesRejection);

impl From<RawBodyRejection> for AppError {
    fn from(rejection: RawBodyRejection) -> Self {
        if rejection.0.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge(FILE_TOO_LARGE_MESSAGE.to_string())
        } else {
            AppError::MalformedRequest(format!(
                "Failed to read request body: {}",
                rejection.0.body_text()
            ))
        }
    }
}

impl IntoResponse for RawBodyRejection {
    fn into_response(self) -> Response {
        // Body rejections are client errors, which never carry internal detail
        EndpointResponse::from_error(&AppError::from(self), "Upload failed", false).into_response()
    }
}
