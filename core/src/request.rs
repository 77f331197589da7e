//! Request construction: one target URL, method, headers, query entries,
//! and at most one transmitted body.
//!
//! # Design
//! Endpoint methods across the catalog call convenience setters defensively,
//! so a spec may end up with several body sources set at once. Exactly one
//! is ever transmitted, picked by a fixed precedence: form map, then local
//! file, then in-memory buffer, then raw string. The losers are silently
//! ignored. `resolved_body` is the single place that precedence lives.
//!
//! A spec is single-use: dispatch consumes it by value, so reuse after send
//! is a compile error rather than a runtime guard.

use std::path::PathBuf;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

pub const HTTP_HEADER_AUTHORIZATION: &str = "Authorization";
pub const HTTP_HEADER_CONTENT_TYPE: &str = "Content-Type";

pub const HTTP_CONTENT_TYPE_JSON: &str = "application/json";
pub const HTTP_CONTENT_TYPE_XFORM: &str = "application/x-www-form-urlencoded";
pub const HTTP_CONTENT_TYPE_CSV: &str = "text/csv";
pub const HTTP_CONTENT_TYPE_OCTET: &str = "application/octet-stream";
pub const HTTP_CONTENT_TYPE_MULTIPART: &str = "multipart/form-data";

/// Characters escaped in query-string and form components. Everything
/// reserved as a delimiter by the URL grammar, plus `%` itself.
const COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'&')
    .add(b'=')
    .add(b'+')
    .add(b'?')
    .add(b'/')
    .add(b'%');

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether this method carries create/update/delete semantics and is
    /// expected to have at least one body or query data source.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

/// The single body variant selected for transmission.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Form(Vec<(String, String)>),
    File(PathBuf),
    Buffer { filename: String, bytes: Vec<u8> },
    Raw(String),
}

/// Accumulates everything needed for one HTTP exchange.
///
/// Built by one call chain, consumed by exactly one dispatch. Header
/// entries keep their set order and allow duplicates; the last write per
/// name wins at transmission time (`effective_headers`).
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    form_params: Vec<(String, String)>,
    file_path: Option<PathBuf>,
    buffer: Option<(String, Vec<u8>)>,
    raw_body: Option<String>,
}

impl RequestSpec {
    /// New spec for an already-resolved absolute URL.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            form_params: Vec::new(),
            file_path: None,
            buffer: None,
            raw_body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Shorthand for setting the `Content-Type` header.
    pub fn content_type(self, value: impl Into<String>) -> Self {
        self.header(HTTP_HEADER_CONTENT_TYPE, value)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_params.push((name.into(), value.into()));
        self
    }

    /// Use the contents of a local file as the request body.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Use an in-memory byte buffer as the request body. `filename` is
    /// reported to the server when the declared content type is multipart.
    pub fn buffer(mut self, filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.buffer = Some((filename.into(), bytes));
        self
    }

    /// Use a pre-encoded string (typically JSON) as the request body.
    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn query_entries(&self) -> &[(String, String)] {
        &self.query
    }

    /// Target URL with the encoded query string appended.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            self.url.clone()
        } else {
            let joiner = if self.url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", self.url, joiner, encode_pairs(&self.query))
        }
    }

    /// Headers as transmitted: duplicates collapsed, last write per name
    /// wins, order of first occurrence preserved.
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        let mut collapsed: Vec<(String, String)> = Vec::new();
        for (name, value) in &self.headers {
            match collapsed
                .iter_mut()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
            {
                Some((_, v)) => *v = value.clone(),
                None => collapsed.push((name.clone(), value.clone())),
            }
        }
        collapsed
    }

    /// Content type as transmitted: an explicit header wins; otherwise the
    /// winning body variant implies one (form → url-encoded, file/buffer →
    /// octet-stream, raw string → JSON). `None` when there is no body and
    /// no explicit header.
    pub fn effective_content_type(&self) -> Option<String> {
        if let Some((_, value)) = self
            .headers
            .iter()
            .rev()
            .find(|(name, _)| name.eq_ignore_ascii_case(HTTP_HEADER_CONTENT_TYPE))
        {
            return Some(value.clone());
        }
        match self.resolved_body()? {
            Body::Form(_) => Some(HTTP_CONTENT_TYPE_XFORM.to_string()),
            Body::File(_) | Body::Buffer { .. } => Some(HTTP_CONTENT_TYPE_OCTET.to_string()),
            Body::Raw(_) => Some(HTTP_CONTENT_TYPE_JSON.to_string()),
        }
    }

    /// The one body variant that will be transmitted, or `None` for a
    /// body-less request. Precedence when several sources were set:
    /// form map, then file path, then buffer, then raw string.
    pub fn resolved_body(&self) -> Option<Body> {
        if !self.form_params.is_empty() {
            return Some(Body::Form(self.form_params.clone()));
        }
        if let Some(path) = &self.file_path {
            return Some(Body::File(path.clone()));
        }
        if let Some((filename, bytes)) = &self.buffer {
            return Some(Body::Buffer {
                filename: filename.clone(),
                bytes: bytes.clone(),
            });
        }
        self.raw_body.clone().map(Body::Raw)
    }

    /// Pre-dispatch well-formedness guard: does this request carry at least
    /// one data source (body variant or query entry)? A mutating request
    /// that returns `false` here is a caller logic error to fix before any
    /// network I/O happens.
    pub fn has_data_source(&self) -> bool {
        self.resolved_body().is_some() || !self.query.is_empty()
    }
}

/// `k=v` pairs percent-encoded and joined with `&`.
pub(crate) fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, COMPONENT),
                utf8_percent_encode(v, COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
