//! Response envelope decode and materialization.
//!
//! # Design
//! Every JSON endpoint answers with the same envelope: `responseStatus`,
//! optional `responseMessage`, `errors`, `warnings`, `responseDetails`, and
//! an optional `data` payload. The status strings and field names are wire
//! contract and must match the server bit-for-bit. `data` is held raw until
//! the caller declares its shape — `data_object` or `data_list` — so one
//! decoded envelope supports every target layout. Binary and
//! streamed-to-file results never enter the envelope; they are separate
//! response types produced by the matching client call.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::model::{value_type_name, AttributeBag};
use crate::transport::RawResponse;

/// Application-level status tag. The serialized literals are fixed by the
/// API: `SUCCESS`, `FAILURE`, `WARNING`, `EXCEPTION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failure,
    Warning,
    Exception,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "SUCCESS",
            ResponseStatus::Failure => "FAILURE",
            ResponseStatus::Warning => "WARNING",
            ResponseStatus::Exception => "EXCEPTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(ResponseStatus::Success),
            "FAILURE" => Some(ResponseStatus::Failure),
            "WARNING" => Some(ResponseStatus::Warning),
            "EXCEPTION" => Some(ResponseStatus::Exception),
            _ => None,
        }
    }
}

/// One structured error from the envelope's `errors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEntry {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One structured warning from the envelope's `warnings` list.
#[derive(Debug, Clone, Deserialize)]
pub struct WarningEntry {
    #[serde(rename = "type", default)]
    pub warning_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Pagination and size metadata from `responseDetails`.
///
/// The cursor fields are complete follow-up URLs returned by the server;
/// `Client::send_page` follows them verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseDetails {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub previous_page: Option<String>,
    #[serde(flatten)]
    pub extra: AttributeBag,
}

impl ResponseDetails {
    pub fn has_next_page(&self) -> bool {
        matches!(&self.next_page, Some(url) if !url.is_empty())
    }

    pub fn has_previous_page(&self) -> bool {
        matches!(&self.previous_page, Some(url) if !url.is_empty())
    }

    /// Whether more pages exist anywhere in the collection. Cursor presence
    /// decides when cursors were sent; when the server omits them, a page
    /// smaller than the total still counts as paginated, so a full single
    /// page (`size == total`) reports false either way.
    pub fn is_paginated(&self) -> bool {
        if self.has_next_page() || self.has_previous_page() {
            return true;
        }
        match (self.size, self.total) {
            (Some(size), Some(total)) => size < total,
            _ => false,
        }
    }
}

/// The decoded top-level response. Unrecognized top-level fields (some
/// endpoints put payload outside `data`) are preserved in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "responseStatus")]
    pub status: ResponseStatus,
    #[serde(rename = "responseMessage", default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    #[serde(default)]
    pub warnings: Vec<WarningEntry>,
    #[serde(rename = "responseDetails", default)]
    pub details: Option<ResponseDetails>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: AttributeBag,
}

impl Envelope {
    /// SUCCESS and WARNING both carry usable data.
    pub fn is_successful(&self) -> bool {
        matches!(
            self.status,
            ResponseStatus::Success | ResponseStatus::Warning
        )
    }

    /// Materialize `data` as a single object of the declared type.
    /// Deterministically `None` on FAILURE/EXCEPTION or absent data; a
    /// present non-object payload is a decode failure.
    pub fn data_object<T: DeserializeOwned>(&self) -> Result<Option<T>, ClientError> {
        match &self.data {
            None | Some(Value::Null) => Ok(None),
            _ if !self.is_successful() => Ok(None),
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ClientError::Decode(format!("data object: {e}"))),
            Some(other) => Err(ClientError::Decode(format!(
                "expected data object, found {}",
                value_type_name(other)
            ))),
        }
    }

    /// Materialize `data` as an ordered list of the declared type.
    /// Deterministically empty on FAILURE/EXCEPTION or absent data; a
    /// present non-array payload is a decode failure.
    pub fn data_list<T: DeserializeOwned>(&self) -> Result<Vec<T>, ClientError> {
        match &self.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            _ if !self.is_successful() => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_json::from_value(item.clone())
                        .map_err(|e| ClientError::Decode(format!("data[{i}]: {e}")))
                })
                .collect(),
            Some(other) => Err(ClientError::Decode(format!(
                "expected data list, found {}",
                value_type_name(other)
            ))),
        }
    }
}

/// Decode the buffered body into an `Envelope`. Malformed JSON, a non-object
/// body, or a missing/unrecognized `responseStatus` are decode failures —
/// never silently defaulted to SUCCESS.
pub fn decode_envelope(raw: &RawResponse) -> Result<Envelope, ClientError> {
    serde_json::from_slice(&raw.body)
        .map_err(|e| ClientError::Decode(format!("response envelope: {e}")))
}

/// A decoded envelope plus the caller-declared single-object view of its
/// `data`.
#[derive(Debug)]
pub struct ObjectResponse<T> {
    pub data: Option<T>,
    pub envelope: Envelope,
}

/// A decoded envelope plus the caller-declared list view of its `data`.
/// For paginated collections the cursors live in `details()`.
#[derive(Debug)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub envelope: Envelope,
}

impl<T> ListResponse<T> {
    pub fn details(&self) -> Option<&ResponseDetails> {
        self.envelope.details.as_ref()
    }

    pub fn has_next_page(&self) -> bool {
        self.details().map(ResponseDetails::has_next_page).unwrap_or(false)
    }

    pub fn has_previous_page(&self) -> bool {
        self.details()
            .map(ResponseDetails::has_previous_page)
            .unwrap_or(false)
    }

    pub fn next_page(&self) -> Option<&str> {
        self.details().and_then(|d| d.next_page.as_deref())
    }

    pub fn previous_page(&self) -> Option<&str> {
        self.details().and_then(|d| d.previous_page.as_deref())
    }
}

/// A raw download buffered in memory. Bypasses the envelope entirely: only
/// the HTTP status and content type accompany the bytes.
#[derive(Debug, Clone)]
pub struct BinaryResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

/// A raw download streamed to disk. Carries the written path instead of an
/// in-memory buffer.
#[derive(Debug, Clone)]
pub struct FileResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub file_path: PathBuf,
}
