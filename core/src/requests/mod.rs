//! Representative endpoint catalog.
//!
//! Thin callers over the core: each function builds a `RequestSpec` from a
//! URL template, dispatches through the `Client`, and declares the target
//! shape for materialization. The full vendor catalog follows these same
//! patterns.

pub mod documents;
pub mod jobs;
pub mod roles;
