//! Client: endpoint resolution, session header injection, dispatch, and
//! materialization surface.
//!
//! # Design
//! The client owns the three things every endpoint call needs — the base
//! URL + API version for first-page URL construction, the session id
//! attached as the `Authorization` header, and the transport. How the
//! session id was obtained (and renewed) is outside this crate; a valid
//! one is injected at construction. Everything here is read-only per call,
//! so one client is safe to share across threads.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::request::{HttpMethod, RequestSpec, HTTP_HEADER_AUTHORIZATION};
use crate::response::{
    decode_envelope, BinaryResponse, Envelope, FileResponse, ListResponse, ObjectResponse,
};
use crate::transport::Transport;

pub const DEFAULT_API_VERSION: &str = "v25.1";

/// Synchronous client for the document-management API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    api_version: String,
    session_id: String,
    transport: Transport,
}

impl Client {
    /// Client against `base_url` (scheme + authority) with an established
    /// session id and the default API version.
    pub fn new(base_url: &str, session_id: &str) -> Self {
        Self::with_version(base_url, session_id, DEFAULT_API_VERSION)
    }

    pub fn with_version(base_url: &str, session_id: &str, api_version: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            session_id: session_id.to_string(),
            transport: Transport::new(),
        }
    }

    /// Client configured from `DOCVAULT_URL` and `DOCVAULT_SESSION_ID`.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("DOCVAULT_URL")
            .map_err(|_| ClientError::Config("DOCVAULT_URL is not set".to_string()))?;
        let session_id = std::env::var("DOCVAULT_SESSION_ID")
            .map_err(|_| ClientError::Config("DOCVAULT_SESSION_ID is not set".to_string()))?;
        Ok(Self::new(&base_url, &session_id))
    }

    /// Swap in a differently-configured transport (e.g. with a timeout).
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Resolve a relative path template into a fully qualified first-page
    /// URL: `{base_url}/api/{version}{path}`.
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}/api/{}{}", self.base_url, self.api_version, path)
    }

    /// Resolve a pagination cursor. The server returns complete follow-up
    /// URLs; an `http(s)` cursor is used verbatim and an absolute-path
    /// cursor is joined to the bare host. Version templating and the
    /// original query parameters are never reapplied.
    pub fn page_endpoint(&self, cursor: &str) -> String {
        if cursor.starts_with("http://") || cursor.starts_with("https://") {
            cursor.to_string()
        } else {
            format!("{}{}", self.base_url, cursor)
        }
    }

    /// Dispatch and decode the response into an `Envelope`. Application
    /// level FAILURE/EXCEPTION statuses are normal return values here;
    /// only transport and decode problems are `Err`.
    pub fn send(&self, spec: RequestSpec) -> Result<Envelope, ClientError> {
        let method = spec.method().as_str();
        let url = spec.full_url();
        tracing::debug!(method, url = url.as_str(), "dispatching request");
        let raw = self.transport.send(self.authorized(spec))?;
        let envelope = decode_envelope(&raw)?;
        if !envelope.is_successful() {
            tracing::warn!(
                method,
                url = url.as_str(),
                status = envelope.status.as_str(),
                message = envelope.message.as_deref().unwrap_or(""),
                "api returned failure"
            );
        }
        Ok(envelope)
    }

    /// Dispatch and materialize `data` as a single object of the declared
    /// type.
    pub fn send_object<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<ObjectResponse<T>, ClientError> {
        let envelope = self.send(spec)?;
        let data = envelope.data_object()?;
        Ok(ObjectResponse { data, envelope })
    }

    /// Dispatch and materialize `data` as a list of the declared type.
    /// For paginated collections the cursors are on the envelope details.
    pub fn send_list<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<ListResponse<T>, ClientError> {
        let envelope = self.send(spec)?;
        let data = envelope.data_list()?;
        Ok(ListResponse { data, envelope })
    }

    /// Dispatch and return the raw body buffered in memory. No envelope
    /// decode happens; downloads are opaque bytes.
    pub fn send_binary(&self, spec: RequestSpec) -> Result<BinaryResponse, ClientError> {
        let method = spec.method().as_str();
        let url = spec.full_url();
        tracing::debug!(method, url = url.as_str(), "dispatching binary request");
        let raw = self.transport.send(self.authorized(spec))?;
        Ok(BinaryResponse {
            status: raw.status,
            content_type: raw.content_type,
            content: raw.body,
        })
    }

    /// Dispatch and stream the raw body to `path`, returning the written
    /// location instead of a buffer.
    pub fn send_to_file(
        &self,
        spec: RequestSpec,
        path: impl AsRef<Path>,
    ) -> Result<FileResponse, ClientError> {
        let path = path.as_ref();
        let method = spec.method().as_str();
        let url = spec.full_url();
        tracing::debug!(
            method,
            url = url.as_str(),
            path = %path.display(),
            "dispatching streamed request"
        );
        let (status, content_type) = self
            .transport
            .send_to_file(self.authorized(spec), path)?;
        Ok(FileResponse {
            status,
            content_type,
            file_path: path.to_path_buf(),
        })
    }

    /// Follow a pagination cursor with a GET, bypassing first-page URL
    /// construction entirely.
    pub fn send_page(&self, cursor: &str) -> Result<Envelope, ClientError> {
        self.send(RequestSpec::new(HttpMethod::Get, self.page_endpoint(cursor)))
    }

    /// Follow a pagination cursor and materialize the page as a list.
    pub fn send_page_list<T: DeserializeOwned>(
        &self,
        cursor: &str,
    ) -> Result<ListResponse<T>, ClientError> {
        self.send_list(RequestSpec::new(
            HttpMethod::Get,
            self.page_endpoint(cursor),
        ))
    }

    fn authorized(&self, spec: RequestSpec) -> RequestSpec {
        spec.header(HTTP_HEADER_AUTHORIZATION, self.session_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new("http://localhost:3000", "sid-123")
    }

    #[test]
    fn api_endpoint_composes_base_version_and_path() {
        assert_eq!(
            client().api_endpoint("/objects/documents"),
            "http://localhost:3000/api/v25.1/objects/documents"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = Client::new("http://localhost:3000/", "sid");
        assert_eq!(
            client.api_endpoint("/objects/documents"),
            "http://localhost:3000/api/v25.1/objects/documents"
        );
    }

    #[test]
    fn version_override_is_used() {
        let client = Client::with_version("http://localhost:3000", "sid", "v24.2");
        assert_eq!(
            client.api_endpoint("/objects/binders"),
            "http://localhost:3000/api/v24.2/objects/binders"
        );
    }

    #[test]
    fn absolute_cursor_is_followed_verbatim() {
        let cursor = "https://other-host.example/api/v25.1/objects/documents?limit=2&offset=2";
        assert_eq!(client().page_endpoint(cursor), cursor);
    }

    #[test]
    fn path_cursor_joins_bare_host_without_retemplating() {
        let cursor = "/api/v25.1/objects/documents?limit=2&offset=2";
        assert_eq!(
            client().page_endpoint(cursor),
            "http://localhost:3000/api/v25.1/objects/documents?limit=2&offset=2"
        );
    }

    #[test]
    fn authorized_attaches_the_session_header() {
        let spec = client().authorized(RequestSpec::new(
            HttpMethod::Get,
            "http://localhost:3000/api/v25.1/x",
        ));
        let headers = spec.effective_headers();
        assert!(headers
            .iter()
            .any(|(name, value)| name == HTTP_HEADER_AUTHORIZATION && value == "sid-123"));
    }
}
