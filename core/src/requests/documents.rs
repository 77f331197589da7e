//! Document endpoints: retrieve, collection paging, create, delete, and
//! source-file download.

use std::path::Path;

use serde::Deserialize;

use crate::client::Client;
use crate::error::ClientError;
use crate::model::AttributeBag;
use crate::request::{HttpMethod, RequestSpec, HTTP_CONTENT_TYPE_XFORM};
use crate::response::{BinaryResponse, Envelope, FileResponse, ListResponse, ObjectResponse};

const URL_DOCUMENTS: &str = "/objects/documents";
const URL_DOCUMENT: &str = "/objects/documents/{id}";
const URL_DOCUMENT_FILE: &str = "/objects/documents/{id}/file";

/// A document as returned by the API. Fields the client does not model
/// explicitly stay available through `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(rename = "name__v", default)]
    pub name: Option<String>,
    #[serde(rename = "type__v", default)]
    pub document_type: Option<String>,
    #[serde(rename = "lifecycle__v", default)]
    pub lifecycle: Option<String>,
    #[serde(rename = "status__v", default)]
    pub status: Option<String>,
    #[serde(rename = "major_version_number__v", default)]
    pub major_version: Option<i32>,
    #[serde(rename = "minor_version_number__v", default)]
    pub minor_version: Option<i32>,
    #[serde(flatten)]
    pub extra: AttributeBag,
}

/// Retrieve the document collection, optionally bounded by `limit` and
/// `offset`. Follow-up pages come from the response cursors, not from
/// recomputing offsets.
pub fn retrieve_all_documents(
    client: &Client,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<ListResponse<Document>, ClientError> {
    let mut spec = RequestSpec::new(HttpMethod::Get, client.api_endpoint(URL_DOCUMENTS));
    if let Some(limit) = limit {
        spec = spec.query("limit", limit.to_string());
    }
    if let Some(offset) = offset {
        spec = spec.query("offset", offset.to_string());
    }
    client.send_list(spec)
}

/// Retrieve a collection page via a cursor from a prior response.
pub fn retrieve_documents_by_page(
    client: &Client,
    cursor: &str,
) -> Result<ListResponse<Document>, ClientError> {
    client.send_page_list(cursor)
}

pub fn retrieve_document(
    client: &Client,
    id: i64,
) -> Result<ObjectResponse<Document>, ClientError> {
    let url = client.api_endpoint(&URL_DOCUMENT.replace("{id}", &id.to_string()));
    client.send_object(RequestSpec::new(HttpMethod::Get, url))
}

/// Create a document from url-encoded form fields. The new document's id
/// comes back at the top level of the envelope (`extra`).
pub fn create_document(
    client: &Client,
    fields: &[(&str, &str)],
) -> Result<Envelope, ClientError> {
    let mut spec = RequestSpec::new(HttpMethod::Post, client.api_endpoint(URL_DOCUMENTS))
        .content_type(HTTP_CONTENT_TYPE_XFORM);
    for (name, value) in fields {
        spec = spec.form_param(*name, *value);
    }
    client.send(spec)
}

pub fn delete_document(client: &Client, id: i64) -> Result<Envelope, ClientError> {
    let url = client.api_endpoint(&URL_DOCUMENT.replace("{id}", &id.to_string()));
    client.send(RequestSpec::new(HttpMethod::Delete, url))
}

/// Download the document's source file, buffered in memory.
pub fn download_document_file(
    client: &Client,
    id: i64,
) -> Result<BinaryResponse, ClientError> {
    let url = client.api_endpoint(&URL_DOCUMENT_FILE.replace("{id}", &id.to_string()));
    client.send_binary(RequestSpec::new(HttpMethod::Get, url))
}

/// Download the document's source file, streamed to `path`.
pub fn download_document_file_to(
    client: &Client,
    id: i64,
    path: impl AsRef<Path>,
) -> Result<FileResponse, ClientError> {
    let url = client.api_endpoint(&URL_DOCUMENT_FILE.replace("{id}", &id.to_string()));
    client.send_to_file(RequestSpec::new(HttpMethod::Get, url), path)
}
