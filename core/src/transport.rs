//! Blocking HTTP exchange built on ureq.
//!
//! # Design
//! One synchronous round-trip per call, no background execution. Non-2xx
//! statuses are returned as data (`http_status_as_error(false)`) so status
//! interpretation stays in the materialization layer. Arbitrary method/body
//! combinations (the batch endpoints DELETE with a CSV body) go through
//! `Agent::run` with a hand-built `http::Request`.

use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::ClientError;
use crate::request::{
    Body, RequestSpec, HTTP_CONTENT_TYPE_MULTIPART, HTTP_HEADER_CONTENT_TYPE,
};

/// A raw HTTP response: status, headers, and the buffered body bytes.
/// Produced by `Transport::send`; materialization decides what the bytes
/// mean.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Synchronous transport wrapping a configured `ureq::Agent`.
///
/// Safe to share across calls; holds no per-request state. A deadline, if
/// wanted, is set at construction and surfaces as a transport failure.
#[derive(Debug, Clone)]
pub struct Transport {
    agent: ureq::Agent,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Transport with a global per-call timeout. Expiry is reported as
    /// `ClientError::Transport`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }

    /// Execute the request and buffer the whole response body in memory.
    pub fn send(&self, spec: RequestSpec) -> Result<RawResponse, ClientError> {
        let mut response = self.exchange(spec)?;
        let status = response.status().as_u16();
        let content_type = header_value(&response, "content-type");
        let headers = collect_headers(&response);
        let mut body = Vec::new();
        response
            .body_mut()
            .as_reader()
            .read_to_end(&mut body)
            .map_err(|e| ClientError::Transport(format!("reading response body: {e}")))?;
        Ok(RawResponse {
            status,
            content_type,
            headers,
            body,
        })
    }

    /// Execute the request and stream the response body to `path` as it
    /// arrives, never holding it in memory. Returns the status and
    /// content type of the exchange.
    pub fn send_to_file(
        &self,
        spec: RequestSpec,
        path: &Path,
    ) -> Result<(u16, Option<String>), ClientError> {
        let mut response = self.exchange(spec)?;
        let status = response.status().as_u16();
        let content_type = header_value(&response, "content-type");
        let mut file = std::fs::File::create(path).map_err(ClientError::File)?;
        std::io::copy(&mut response.body_mut().as_reader(), &mut file)
            .map_err(|e| ClientError::Transport(format!("streaming response to file: {e}")))?;
        file.flush().map_err(ClientError::File)?;
        Ok((status, content_type))
    }

    fn exchange(
        &self,
        spec: RequestSpec,
    ) -> Result<ureq::http::Response<ureq::Body>, ClientError> {
        let url = spec.full_url();
        let (body, content_type) = encode_body(&spec)?;

        let mut builder = ureq::http::Request::builder()
            .method(spec.method().as_str())
            .uri(url.as_str());
        for (name, value) in spec.effective_headers() {
            if !name.eq_ignore_ascii_case(HTTP_HEADER_CONTENT_TYPE) {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if let Some(ct) = &content_type {
            builder = builder.header(HTTP_HEADER_CONTENT_TYPE, ct.as_str());
        }
        let request = builder
            .body(body.as_slice())
            .map_err(|e| ClientError::Transport(format!("building request for {url}: {e}")))?;

        self.agent
            .run(request)
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

/// Encode the winning body variant into transmit bytes plus the final
/// content type (boundary parameter included for multipart).
fn encode_body(spec: &RequestSpec) -> Result<(Vec<u8>, Option<String>), ClientError> {
    let declared = spec.effective_content_type();
    match spec.resolved_body() {
        None => Ok((Vec::new(), declared)),
        Some(Body::Form(pairs)) => Ok((
            crate::request::encode_pairs(&pairs).into_bytes(),
            declared,
        )),
        Some(Body::File(path)) => {
            let bytes = std::fs::read(&path).map_err(ClientError::File)?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string());
            Ok(wrap_if_multipart(bytes, &filename, declared))
        }
        Some(Body::Buffer { filename, bytes }) => {
            Ok(wrap_if_multipart(bytes, &filename, declared))
        }
        Some(Body::Raw(s)) => Ok((s.into_bytes(), declared)),
    }
}

/// Wrap file/buffer bytes in a single-part multipart body when the declared
/// content type asks for it; otherwise transmit the bytes as-is under the
/// declared type.
fn wrap_if_multipart(
    bytes: Vec<u8>,
    filename: &str,
    declared: Option<String>,
) -> (Vec<u8>, Option<String>) {
    match declared {
        Some(ct) if ct.starts_with(HTTP_CONTENT_TYPE_MULTIPART) && !ct.contains("boundary=") => {
            let boundary = multipart_boundary();
            let mut body = Vec::with_capacity(bytes.len() + 256);
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(&bytes);
            body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
            (body, Some(format!("{ct}; boundary={boundary}")))
        }
        other => (bytes, other),
    }
}

fn multipart_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("----docvault{nanos:032x}")
}

fn collect_headers(response: &ureq::http::Response<ureq::Body>) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn header_value(response: &ureq::http::Response<ureq::Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
