//! Remote Fetcher — bounded download of a resume document from a URL.
//!
//! Enforces a fixed timeout and a 10MB size cap. The cap is checked twice:
//! against the declared Content-Length before the body is read, and again
//! while streaming the actual bytes.

use bytes::{Bytes, BytesMut};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::extract::is_valid_extension;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to download file: HTTP {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after 30 seconds")]
    Timeout,

    #[error("Failed to download file: {0}")]
    Network(String),

    #[error("File size ({actual_mb:.2}MB) exceeds maximum allowed size of 10MB")]
    TooLarge { actual_mb: f64 },

    #[error("Invalid file type. Allowed types: .pdf, .doc, .docx")]
    InvalidExtension,
}

/// Downloads resume documents with a fixed timeout and size cap.
#[derive(Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl Default for RemoteFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(DOWNLOAD_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Downloads a file and returns its content and inferred filename.
    pub async fn download(&self, url: &str) -> Result<(Bytes, String), FetchError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let filename = infer_filename(url, response.headers());
        check_declared_size(response.headers())?;

        // Stream the body so the cap fires mid-download, not after.
        let mut response = response;
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(map_reqwest_err)? {
            body.extend_from_slice(&chunk);
            if body.len() > MAX_FILE_SIZE {
                return Err(FetchError::TooLarge {
                    actual_mb: body.len() as f64 / MB,
                });
            }
        }

        if !is_valid_extension(&filename) {
            return Err(FetchError::InvalidExtension);
        }

        debug!("Downloaded {} ({} bytes)", filename, body.len());
        Ok((body.freeze(), filename))
    }
}

fn map_reqwest_err(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Rejects on the declared Content-Length before any body bytes are read.
fn check_declared_size(headers: &HeaderMap) -> Result<(), FetchError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(len) if len > MAX_FILE_SIZE as u64 => Err(FetchError::TooLarge {
            actual_mb: len as f64 / MB,
        }),
        _ => Ok(()),
    }
}

/// Infers a filename: Content-Disposition first, then the URL path, then a
/// default derived from the declared content type (PDF when ambiguous).
fn infer_filename(url: &str, headers: &HeaderMap) -> String {
    if let Some(name) = disposition_filename(headers) {
        return name;
    }

    let path = url.split('?').next().unwrap_or(url);
    let candidate = path.rsplit('/').next().unwrap_or("");
    if candidate.contains('.') {
        return candidate.to_string();
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    if content_type.contains("msword") || content_type.contains("wordprocessingml") {
        "resume.docx".to_string()
    } else {
        "resume.pdf".to_string()
    }
}

fn disposition_filename(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    let (_, rest) = raw.split_once("filename=")?;
    let name = rest
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
