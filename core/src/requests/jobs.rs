//! Job endpoints. Long-running server work returns a job id; callers poll
//! the status endpoint at their own cadence.

use serde::Deserialize;

use crate::client::Client;
use crate::error::ClientError;
use crate::model::AttributeBag;
use crate::request::{HttpMethod, RequestSpec};
use crate::response::{ListResponse, ObjectResponse};

const URL_JOB_STATUS: &str = "/services/jobs/{job_id}";
const URL_JOB_MONITORS: &str = "/services/jobs/monitors";

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(rename = "job_id", default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: AttributeBag,
}

pub fn retrieve_job_status(
    client: &Client,
    job_id: i64,
) -> Result<ObjectResponse<Job>, ClientError> {
    let url = client.api_endpoint(&URL_JOB_STATUS.replace("{job_id}", &job_id.to_string()));
    client.send_object(RequestSpec::new(HttpMethod::Get, url))
}

/// Monitors for jobs that have not yet completed, paginated like any other
/// collection.
pub fn retrieve_job_monitors(
    client: &Client,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<ListResponse<Job>, ClientError> {
    let mut spec = RequestSpec::new(HttpMethod::Get, client.api_endpoint(URL_JOB_MONITORS));
    if let Some(limit) = limit {
        spec = spec.query("limit", limit.to_string());
    }
    if let Some(offset) = offset {
        spec = spec.query("offset", offset.to_string());
    }
    client.send_list(spec)
}

pub fn retrieve_job_monitors_by_page(
    client: &Client,
    cursor: &str,
) -> Result<ListResponse<Job>, ClientError> {
    client.send_page_list(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_decodes_with_unmodeled_fields() {
        let job: Job = serde_json::from_str(
            r#"{"job_id":1001,"title":"Nightly audit export","status":"RUNNING","created_by":5}"#,
        )
        .unwrap();
        assert_eq!(job.job_id, Some(1001));
        assert_eq!(job.status.as_deref(), Some("RUNNING"));
        assert_eq!(job.extra.get_long("created_by").unwrap(), Some(5));
    }
}
