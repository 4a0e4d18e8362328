//! Serverless function adapter
//!
//! Translates a function-platform event (`httpMethod`, `headers`, `body`,
//! `isBase64Encoded`) into an endpoint request and the endpoint response back into
//! the platform's `{statusCode, headers, body}` shape. CORS preflight is answered here.

use axum::{
    body::Bytes,
    http::{Method, StatusCode},
};
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::images::services::ImageService;
use crate::shared::types::{EndpointRequest, EndpointResponse};

const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// Incoming function invocation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// Function result handed back to the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FunctionEvent {
    /// Header lookup; platforms do not agree on header name casing
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Raw body bytes, decoding base64 when the platform says so
    pub fn body_bytes(&self) -> Result<Bytes, AppError> {
        match (&self.body, self.is_base64_encoded) {
            (None, _) => Ok(Bytes::new()),
            (Some(body), true) => BASE64_STANDARD
                .decode(body.trim())
                .map(Bytes::from)
                .map_err(|e| AppError::MalformedRequest(format!("Invalid base64 body: {}", e))),
            (Some(body), false) => Ok(Bytes::from(body.clone().into_bytes())),
        }
    }
}

pub struct FunctionHandler {
    service: Arc<ImageService>,
    allow_origin: String,
}

impl FunctionHandler {
    pub fn new(service: Arc<ImageService>, allow_origin: impl Into<String>) -> Self {
        Self {
            service,
            allow_origin: allow_origin.into(),
        }
    }

    pub async fn handle(&self, event: FunctionEvent) -> FunctionResponse {
        debug!("Function invoked: method={}", event.http_method);

        let method = Method::from_bytes(event.http_method.trim().to_ascii_uppercase().as_bytes());

        let response = match method {
            Ok(Method::OPTIONS) => {
                return self.respond(StatusCode::OK, String::new());
            }
            Ok(method) => match event.body_bytes() {
                Ok(body) => {
                    let content_type = event.header("content-type").map(str::to_string);
                    self.service
                        .handle(EndpointRequest::new(method).with_body(content_type, body))
                        .await
                }
                Err(e) => self.service.error_response(&e),
            },
            Err(_) => self.service.error_response(&AppError::MethodNotAllowed),
        };

        self.respond_with(response)
    }

    fn respond_with(&self, response: EndpointResponse) -> FunctionResponse {
        self.respond(response.status, response.body_text())
    }

    fn respond(&self, status: StatusCode, body: String) -> FunctionResponse {
        FunctionResponse {
            status_code: status.as_u16(),
            headers: self.headers(),
            body,
        }
    }

    fn headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "Access-Control-Allow-Origin".to_string(),
                self.allow_origin.clone(),
            ),
            (
                "Access-Control-Allow-Headers".to_string(),
                ALLOW_HEADERS.to_string(),
            ),
            (
                "Access-Control-Allow-Methods".to_string(),
                ALLOW_METHODS.to_string(),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ])
    }
}
