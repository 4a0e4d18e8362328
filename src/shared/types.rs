use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::core::error::{AppError, ErrorBody};

/// Platform-neutral request handed to the upload endpoint core
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    pub method: Method,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl EndpointRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            content_type: None,
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, content_type: Option<String>, body: Bytes) -> Self {
        self.content_type = content_type;
        self.body = body;
        self
    }
}

/// Platform-neutral JSON response produced by the upload endpoint core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl EndpointResponse {
    pub fn json<T: Serialize>(status: StatusCode, data: &T) -> Self {
        match serde_json::to_vec(data) {
            Ok(body) => Self { status, body },
            Err(e) => {
                tracing::error!("Failed to serialize response body: {}", e);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: br#"{"error":"Internal server error"}"#.to_vec(),
                }
            }
        }
    }

    pub fn from_error(err: &AppError, fallback: &str, expose_details: bool) -> Self {
        let (status, body) = err.render(fallback, expose_details);
        Self::json(status, &body)
    }

    /// Body as UTF-8 text; JSON bodies are always valid UTF-8
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Error message of an error response, if the body is an `ErrorBody`
    #[cfg(test)]
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .map(|body| body.error)
    }
}

impl IntoResponse for EndpointResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}
