//! Synchronous client core for a document-management REST API.
//!
//! # Overview
//! Several hundred vendor endpoints share one pipeline: build a
//! `RequestSpec` (URL template, headers, query, at most one body variant),
//! dispatch it through the blocking `Transport`, then materialize the
//! response — a decoded `Envelope` with a caller-declared `data` shape,
//! buffered bytes, or a file streamed to disk. This crate is that pipeline
//! plus a representative slice of the endpoint catalog.
//!
//! # Design
//! - `Client` holds only the base URL, API version, injected session id,
//!   and transport; every call is a single blocking round-trip.
//! - Models are `AttributeBag`s (ordered string→value maps with typed,
//!   coercing accessors) or serde DTOs that flatten one, so server fields
//!   unknown at compile time are never dropped.
//! - Body-encoding conflicts resolve by fixed precedence (form map > file >
//!   buffer > raw string) in exactly one place.
//! - Pagination cursors returned by the server are followed verbatim,
//!   bypassing first-page URL construction.
//! - Application-level FAILURE/EXCEPTION envelopes are ordinary return
//!   values; only transport and decode problems are `Err`.

pub mod bulk;
pub mod client;
pub mod error;
pub mod model;
pub mod request;
pub mod requests;
pub mod response;
pub mod transport;

pub use bulk::{RowIdentifier, RowOutcome};
pub use client::{Client, DEFAULT_API_VERSION};
pub use error::{ClientError, TypeMismatch};
pub use model::AttributeBag;
pub use request::{Body, HttpMethod, RequestSpec};
pub use response::{
    BinaryResponse, Envelope, ErrorEntry, FileResponse, ListResponse, ObjectResponse,
    ResponseDetails, ResponseStatus, WarningEntry,
};
pub use transport::{RawResponse, Transport};
