//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own server on a random port (isolated state), then
//! exercises the full pipeline over real HTTP: request construction,
//! blocking transport, envelope materialization, pagination cursors, bulk
//! correlation, and the binary/streamed download modes.

use docvault_core::bulk::{self, RowIdentifier};
use docvault_core::requests::{documents, jobs, roles};
use docvault_core::{Client, ClientError, HttpMethod, RequestSpec, ResponseStatus};

/// Start the mock server on a random port and return a client bound to it.
fn start_client() -> Client {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    Client::new(&format!("http://{addr}"), "test-session-id")
}

fn seed_documents(client: &Client, count: usize) -> Vec<i64> {
    (0..count)
        .map(|i| {
            let name = format!("Document {i}");
            let envelope = documents::create_document(
                client,
                &[("name__v", name.as_str()), ("type__v", "report__c")],
            )
            .unwrap();
            assert_eq!(envelope.status, ResponseStatus::Success);
            envelope.extra.get_long("id").unwrap().unwrap()
        })
        .collect()
}

#[test]
fn create_echoes_the_new_id_outside_data() {
    let client = start_client();
    let envelope =
        documents::create_document(&client, &[("name__v", "Initial Protocol")]).unwrap();
    assert_eq!(envelope.status, ResponseStatus::Success);
    assert_eq!(
        envelope.message.as_deref(),
        Some("Successfully created document")
    );
    // The vendor puts the new id at the top level, not under `data`.
    assert_eq!(envelope.extra.get_long("id").unwrap(), Some(1));
}

#[test]
fn retrieve_materializes_known_and_unknown_fields() {
    let client = start_client();
    let ids = seed_documents(&client, 1);

    let response = documents::retrieve_document(&client, ids[0]).unwrap();
    assert!(response.envelope.is_successful());
    let doc = response.data.unwrap();
    assert_eq!(doc.id, ids[0]);
    assert_eq!(doc.name.as_deref(), Some("Document 0"));
    assert_eq!(doc.document_type.as_deref(), Some("report__c"));
    assert_eq!(doc.lifecycle.as_deref(), Some("general_lifecycle__c"));
    // Fields the DTO does not model survive in the bag.
    assert_eq!(doc.extra.get_boolean("archive__v").unwrap(), Some(false));
}

#[test]
fn application_failure_is_a_normal_value_with_no_data() {
    let client = start_client();
    let response = documents::retrieve_document(&client, 424242).unwrap();
    assert_eq!(response.envelope.status, ResponseStatus::Failure);
    assert!(!response.envelope.errors.is_empty());
    assert_eq!(
        response.envelope.errors[0].error_type.as_deref(),
        Some("INVALID_DATA")
    );
    assert!(response.data.is_none());
}

#[test]
fn delete_then_retrieve_reports_failure() {
    let client = start_client();
    let ids = seed_documents(&client, 1);

    let envelope = documents::delete_document(&client, ids[0]).unwrap();
    assert_eq!(envelope.status, ResponseStatus::Success);
    let deleted: docvault_core::AttributeBag = envelope.data_object().unwrap().unwrap();
    assert_eq!(deleted.get_long("id").unwrap(), Some(ids[0]));

    let response = documents::retrieve_document(&client, ids[0]).unwrap();
    assert_eq!(response.envelope.status, ResponseStatus::Failure);
    assert!(response.data.is_none());

    // Deleting again fails the same way.
    let envelope = documents::delete_document(&client, ids[0]).unwrap();
    assert_eq!(envelope.status, ResponseStatus::Failure);
    assert!(!envelope.errors.is_empty());
}

#[test]
fn pagination_cursors_round_trip_to_the_same_page() {
    let client = start_client();
    let ids = seed_documents(&client, 5);

    let page1 = documents::retrieve_all_documents(&client, Some(2), None).unwrap();
    let page1_ids: Vec<i64> = page1.data.iter().map(|d| d.id).collect();
    assert_eq!(page1_ids, &ids[0..2]);
    assert!(page1.has_next_page());
    assert!(!page1.has_previous_page());

    // Follow the server-returned cursor verbatim; no URL reconstruction.
    let page2 =
        documents::retrieve_documents_by_page(&client, page1.next_page().unwrap()).unwrap();
    let page2_ids: Vec<i64> = page2.data.iter().map(|d| d.id).collect();
    assert_eq!(page2_ids, &ids[2..4]);
    assert!(page2.has_next_page());
    assert!(page2.has_previous_page());

    // Back via previous_page: identical ids in identical order.
    let back =
        documents::retrieve_documents_by_page(&client, page2.previous_page().unwrap()).unwrap();
    let back_ids: Vec<i64> = back.data.iter().map(|d| d.id).collect();
    assert_eq!(back_ids, page1_ids);

    // The last page has a previous cursor but no next.
    let page3 = documents::retrieve_documents_by_page(&client, page2.next_page().unwrap()).unwrap();
    let page3_ids: Vec<i64> = page3.data.iter().map(|d| d.id).collect();
    assert_eq!(page3_ids, &ids[4..5]);
    assert!(!page3.has_next_page());
    assert!(page3.has_previous_page());
}

#[test]
fn full_single_page_reports_unpaginated() {
    let client = start_client();
    seed_documents(&client, 3);

    let page = documents::retrieve_all_documents(&client, Some(50), None).unwrap();
    assert_eq!(page.data.len(), 3);
    let details = page.details().unwrap();
    assert_eq!(details.size, Some(3));
    assert_eq!(details.total, Some(3));
    assert!(!details.has_next_page());
    assert!(!details.has_previous_page());
    assert!(!details.is_paginated());
}

#[test]
fn bulk_batch_outcomes_zip_against_input_rows_in_order() {
    let client = start_client();
    let ids = seed_documents(&client, 2);
    assert_eq!(ids, vec![1, 2]);

    // Two valid rows and a third referencing a document that does not
    // exist; the batch itself still succeeds.
    let input_rows = [
        "1,editor__v,2001".to_string(),
        "2,editor__v,2002".to_string(),
        "99999,editor__v,2003".to_string(),
    ];
    let csv = format!("id,role,member\n{}\n", input_rows.join("\n"));
    let envelope = roles::assign_roles_on_multiple_documents(
        &client,
        roles::BatchInput::CsvBuffer {
            filename: "roles.csv".to_string(),
            bytes: csv.into_bytes(),
        },
    )
    .unwrap();
    assert_eq!(envelope.status, ResponseStatus::Success);

    let zipped = bulk::zip_rows(&input_rows, &envelope).unwrap();
    assert_eq!(zipped.len(), 3);

    let (row, outcome) = &zipped[0];
    assert_eq!(row.as_str(), "1,editor__v,2001");
    assert_eq!(outcome.identifier, RowIdentifier::Id(1));
    assert!(outcome.is_successful());
    assert_eq!(
        outcome.attributes.get_long_list("editor__v.users").unwrap(),
        Some(vec![2001])
    );

    let (_, outcome) = &zipped[1];
    assert_eq!(outcome.identifier, RowIdentifier::Id(2));
    assert!(outcome.is_successful());

    let (row, outcome) = &zipped[2];
    assert_eq!(row.as_str(), "99999,editor__v,2003");
    assert_eq!(outcome.identifier, RowIdentifier::Id(99999));
    assert_eq!(outcome.status, ResponseStatus::Failure);

    // The assignment from row 1 is visible on the document.
    let (doc_roles, _) = roles::retrieve_document_roles(&client, 1).unwrap();
    let editor = doc_roles
        .iter()
        .find(|r| r.name.as_deref() == Some("editor__v"))
        .unwrap();
    assert_eq!(editor.assigned_users, vec![2001]);
}

#[test]
fn bulk_remove_reverses_a_prior_assignment() {
    let client = start_client();
    seed_documents(&client, 1);

    let assign_csv = "id,role,member\n1,editor__v,2001\n".to_string();
    roles::assign_roles_on_multiple_documents(
        &client,
        roles::BatchInput::CsvBuffer {
            filename: "assign.csv".to_string(),
            bytes: assign_csv.into_bytes(),
        },
    )
    .unwrap();

    let remove_csv = "id,role,member\n1,editor__v,2001\n".to_string();
    let envelope = roles::remove_roles_on_multiple_documents(
        &client,
        roles::BatchInput::CsvBuffer {
            filename: "remove.csv".to_string(),
            bytes: remove_csv.into_bytes(),
        },
    )
    .unwrap();
    assert_eq!(envelope.status, ResponseStatus::Success);

    let (doc_roles, _) = roles::retrieve_document_roles(&client, 1).unwrap();
    let editor = doc_roles
        .iter()
        .find(|r| r.name.as_deref() == Some("editor__v"))
        .unwrap();
    assert!(editor.assigned_users.is_empty());
}

#[test]
fn single_document_role_assignment_via_form_params() {
    let client = start_client();
    seed_documents(&client, 1);

    let envelope =
        roles::assign_roles_on_document(&client, 1, &[("reviewer__v.users", "3001,3002")])
            .unwrap();
    assert_eq!(envelope.status, ResponseStatus::Success);

    let (doc_roles, _) = roles::retrieve_document_roles(&client, 1).unwrap();
    let reviewer = doc_roles
        .iter()
        .find(|r| r.name.as_deref() == Some("reviewer__v"))
        .unwrap();
    assert_eq!(reviewer.assigned_users, vec![3001, 3002]);
}

#[test]
fn buffered_and_streamed_downloads_yield_identical_bytes() {
    let client = start_client();
    let ids = seed_documents(&client, 1);

    let buffered = documents::download_document_file(&client, ids[0]).unwrap();
    assert_eq!(buffered.status, 200);
    assert_eq!(
        buffered.content_type.as_deref(),
        Some("application/octet-stream")
    );
    assert!(!buffered.content.is_empty());

    let path = std::env::temp_dir().join(format!(
        "docvault-it-{}-{}.bin",
        std::process::id(),
        ids[0]
    ));
    let streamed = documents::download_document_file_to(&client, ids[0], &path).unwrap();
    assert_eq!(streamed.status, 200);
    assert_eq!(streamed.file_path, path);

    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, buffered.content);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn job_status_and_monitor_pagination() {
    let client = start_client();

    let status = jobs::retrieve_job_status(&client, 1001).unwrap();
    let job = status.data.unwrap();
    assert_eq!(job.job_id, Some(1001));
    assert_eq!(job.status.as_deref(), Some("SUCCESS"));

    let monitors = jobs::retrieve_job_monitors(&client, Some(1), None).unwrap();
    assert_eq!(monitors.data.len(), 1);
    assert!(monitors.has_next_page());

    let next = jobs::retrieve_job_monitors_by_page(&client, monitors.next_page().unwrap())
        .unwrap();
    assert_eq!(next.data.len(), 1);
    assert_ne!(next.data[0].job_id, monitors.data[0].job_id);
}

#[test]
fn empty_session_id_gets_an_invalid_session_failure() {
    let base = {
        let client = start_client();
        client.base_url().to_string()
    };
    let anonymous = Client::new(&base, "");
    let response = documents::retrieve_document(&anonymous, 1).unwrap();
    assert_eq!(response.envelope.status, ResponseStatus::Failure);
    assert_eq!(
        response.envelope.errors[0].error_type.as_deref(),
        Some("INVALID_SESSION_ID")
    );
    assert!(response.data.is_none());
}

#[test]
fn connection_failure_is_a_transport_error() {
    // Nothing listens on the discard port.
    let client = Client::new("http://127.0.0.1:9", "sid");
    let err = documents::retrieve_document(&client, 1).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[test]
fn non_json_body_where_an_envelope_was_expected_is_a_decode_error() {
    let client = start_client();
    let ids = seed_documents(&client, 1);

    // The file endpoint answers with raw bytes; decoding it as an envelope
    // must fail as Decode, not Transport.
    let url = client.api_endpoint(&format!("/objects/documents/{}/file", ids[0]));
    let err = client
        .send(RequestSpec::new(HttpMethod::Get, url))
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}
