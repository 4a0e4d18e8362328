//! Decoder for `multipart/form-data` request bodies
//!
//! Extracts the first embedded file from a raw body. The body is handled strictly as
//! bytes; only part headers are interpreted as text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{AppError, Result};
use crate::features::images::models::UploadedFile;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CRLF: &[u8] = b"\r\n";

lazy_static! {
    /// `boundary=` parameter of a Content-Type header, quoted or bare
    static ref BOUNDARY_REGEX: Regex =
        Regex::new(r#"(?i)boundary=(?:"([^"]*)"|([^;\s]*))"#).unwrap();

    /// `filename=` attribute of a Content-Disposition header, quoted or bare
    static ref FILENAME_REGEX: Regex =
        Regex::new(r#"(?i)(?:^|[;\s])filename=(?:"([^"]*)"|([^;\s]+))"#).unwrap();
}

/// Decode the first file part of a multipart body
///
/// # Arguments
/// * `raw_body` - The request body exactly as received
/// * `content_type` - The request's Content-Type header, if any
///
/// # Errors
/// * `MalformedRequest` when the header is missing, not multipart, or has no boundary
/// * `NoFilePresent` when no part carries a filename or the selected payload is empty
pub fn decode(raw_body: &[u8], content_type: Option<&str>) -> Result<UploadedFile> {
    let content_type = content_type
        .filter(|ct| ct.to_ascii_lowercase().contains(MULTIPART_FORM_DATA))
        .ok_or_else(|| AppError::MalformedRequest("Invalid content type".to_string()))?;

    let boundary = extract_boundary(content_type)
        .ok_or_else(|| AppError::MalformedRequest("No boundary found".to_string()))?;

    let delimiter = format!("--{}", boundary).into_bytes();

    for part in split_parts(raw_body, &delimiter) {
        // Parts without a header block (preamble, closing marker) cannot carry a file
        let Some(header_end) = find(part, HEADER_TERMINATOR) else {
            continue;
        };

        let headers = PartHeaders::parse(&part[..header_end]);
        let Some(filename) = headers.file_name() else {
            continue;
        };

        let payload = &part[header_end + HEADER_TERMINATOR.len()..];
        let payload = payload.strip_suffix(CRLF).unwrap_or(payload);

        if payload.is_empty() {
            return Err(AppError::NoFilePresent(
                "No image file provided".to_string(),
            ));
        }

        let declared_content_type = headers
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        return Ok(UploadedFile::new(
            payload.to_vec(),
            filename,
            declared_content_type,
        ));
    }

    Err(AppError::NoFilePresent(
        "No image file provided".to_string(),
    ))
}

/// Extract the boundary parameter from a Content-Type header value
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let captures = BOUNDARY_REGEX.captures(content_type)?;
    let boundary = captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().trim())?;

    if boundary.is_empty() {
        None
    } else {
        Some(boundary.to_string())
    }
}

/// Headers of a single multipart part that the decoder cares about
#[derive(Debug, Default)]
struct PartHeaders {
    disposition: Option<String>,
    content_type: Option<String>,
}

impl PartHeaders {
    fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut headers = PartHeaders::default();

        for line in text.split("\r\n").filter(|l| !l.is_empty()) {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();

            if name.trim().eq_ignore_ascii_case("content-disposition") {
                headers.disposition = Some(value);
            } else if name.trim().eq_ignore_ascii_case("content-type") {
                headers.content_type = Some(value);
            }
        }

        headers
    }

    /// The part's filename, if this is a `form-data` part that carries one
    fn file_name(&self) -> Option<String> {
        let disposition = self.disposition.as_deref()?;
        if !disposition.to_ascii_lowercase().starts_with("form-data") {
            return None;
        }

        let captures = FILENAME_REGEX.captures(disposition)?;
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_string())
    }
}

/// Split `body` on every occurrence of `delimiter`, keeping order
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = body;

    while let Some(pos) = find(rest, delimiter) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + delimiter.len()..];
    }
    parts.push(rest);

    parts
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
