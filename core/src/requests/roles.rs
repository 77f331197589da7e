//! Role endpoints: retrieve/assign on a single document, and the CSV batch
//! endpoints that assign or remove roles on many documents at once.

use std::path::PathBuf;

use serde::Deserialize;

use crate::client::Client;
use crate::error::ClientError;
use crate::model::AttributeBag;
use crate::request::{
    HttpMethod, RequestSpec, HTTP_CONTENT_TYPE_CSV, HTTP_CONTENT_TYPE_XFORM,
};
use crate::response::Envelope;

const URL_DOC_ROLES: &str = "/objects/documents/{id}/roles";
const URL_DOC_ROLE_BATCH: &str = "/objects/documents/roles/batch";

/// A role with its membership, from the `documentRoles` list.
#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "assignedUsers", default)]
    pub assigned_users: Vec<i64>,
    #[serde(rename = "assignedGroups", default)]
    pub assigned_groups: Vec<i64>,
    #[serde(flatten)]
    pub extra: AttributeBag,
}

/// CSV input for the batch endpoints, transmitted opaquely. The maximum
/// batch size and CSV format rules are the server's; the client does not
/// parse the rows.
#[derive(Debug, Clone)]
pub enum BatchInput {
    CsvFile(PathBuf),
    CsvBuffer { filename: String, bytes: Vec<u8> },
}

/// Retrieve all roles on a document. The API returns them in a
/// `documentRoles` field outside `data`, preserved on the envelope's
/// `extra` bag.
pub fn retrieve_document_roles(
    client: &Client,
    id: i64,
) -> Result<(Vec<Role>, Envelope), ClientError> {
    let url = client.api_endpoint(&URL_DOC_ROLES.replace("{id}", &id.to_string()));
    let envelope = client.send(RequestSpec::new(HttpMethod::Get, url))?;
    let roles = match envelope.extra.get("documentRoles") {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ClientError::Decode(format!("documentRoles: {e}")))?,
        None => Vec::new(),
    };
    Ok((roles, envelope))
}

/// Assign users/groups to roles on a single document via form params, e.g.
/// `("editor__v.users", "2001,2002")`.
pub fn assign_roles_on_document(
    client: &Client,
    id: i64,
    params: &[(&str, &str)],
) -> Result<Envelope, ClientError> {
    let url = client.api_endpoint(&URL_DOC_ROLES.replace("{id}", &id.to_string()));
    let mut spec =
        RequestSpec::new(HttpMethod::Post, url).content_type(HTTP_CONTENT_TYPE_XFORM);
    for (name, value) in params {
        spec = spec.form_param(*name, *value);
    }
    client.send(spec)
}

/// Assign users/groups to roles on multiple documents from CSV rows.
/// One outcome entry per input row comes back in `data`; correlate with
/// `bulk::zip_rows`.
pub fn assign_roles_on_multiple_documents(
    client: &Client,
    input: BatchInput,
) -> Result<Envelope, ClientError> {
    batch(client, HttpMethod::Post, input)
}

/// Remove users/groups from roles on multiple documents from CSV rows.
pub fn remove_roles_on_multiple_documents(
    client: &Client,
    input: BatchInput,
) -> Result<Envelope, ClientError> {
    batch(client, HttpMethod::Delete, input)
}

fn batch(
    client: &Client,
    method: HttpMethod,
    input: BatchInput,
) -> Result<Envelope, ClientError> {
    let spec = RequestSpec::new(method, client.api_endpoint(URL_DOC_ROLE_BATCH))
        .content_type(HTTP_CONTENT_TYPE_CSV);
    let spec = match input {
        BatchInput::CsvFile(path) => spec.file(path),
        BatchInput::CsvBuffer { filename, bytes } => spec.buffer(filename, bytes),
    };
    debug_assert!(spec.has_data_source());
    client.send(spec)
}
