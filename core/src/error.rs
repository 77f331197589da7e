//! Error types for the client core.
//!
//! # Design
//! Only failures the framework cannot hand back as data become errors:
//! transport-level failures (no response exists) and decode failures (a
//! response exists but is not the expected shape). An envelope whose status
//! is FAILURE or EXCEPTION is a normal return value carrying its errors
//! list — never a `ClientError`.

use std::fmt;

/// Errors returned by dispatch and materialization.
#[derive(Debug)]
pub enum ClientError {
    /// Connection, DNS, TLS, or timeout failure — no response body exists.
    Transport(String),

    /// The HTTP exchange succeeded but the body could not be decoded into
    /// the expected shape (malformed JSON, missing or unrecognized response
    /// status, wrong `data` shape, bulk row count mismatch).
    Decode(String),

    /// A local file could not be read (request body source) or written
    /// (streamed-to-file response).
    File(std::io::Error),

    /// Client construction failed before any request existed (e.g. a
    /// missing environment variable in `Client::from_env`).
    Config(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport failure: {msg}"),
            ClientError::Decode(msg) => write!(f, "decode failure: {msg}"),
            ClientError::File(err) => write!(f, "file I/O failure: {err}"),
            ClientError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::File(err) => Some(err),
            _ => None,
        }
    }
}

/// A field was present but its stored shape cannot coerce to the requested
/// type. Distinct from "field absent", which typed accessors report as
/// `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub key: String,
    pub requested: &'static str,
    pub found: &'static str,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attribute {:?} holds {} where {} was requested",
            self.key, self.found, self.requested
        )
    }
}

impl std::error::Error for TypeMismatch {}

impl From<TypeMismatch> for ClientError {
    fn from(err: TypeMismatch) -> Self {
        ClientError::Decode(err.to_string())
    }
}
