//! Named read operations

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{Application, Job, Record};
use crate::transport::FetchError;

/// A reusable remote read, keyed by name and optional parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum Operation {
    /// Every active posting
    OpenJobs,
    /// Postings created by the signed-in employer
    MyJobs,
    /// Applications submitted by one user
    UserApplications { user_id: String },
    /// Applications received for one posting
    JobApplicants { job_id: String },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::OpenJobs => "open-jobs",
            Operation::MyJobs => "my-jobs",
            Operation::UserApplications { .. } => "user-applications",
            Operation::JobApplicants { .. } => "job-applicants",
        }
    }

    /// API path the operation reads
    pub fn resource_path(&self) -> String {
        match self {
            Operation::OpenJobs => "/api/jobs".to_string(),
            Operation::MyJobs => "/api/jobs/employer/my-jobs".to_string(),
            Operation::UserApplications { user_id } => {
                format!("/api/applications/user/{}", urlencoding::encode(user_id))
            }
            Operation::JobApplicants { job_id } => format!("/api/applications/job/{}", urlencoding::encode(job_id)),
        }
    }

    /// Shown when a read fails and the server gave no message
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::OpenJobs => "Failed to fetch jobs",
            Operation::MyJobs => "Failed to fetch your jobs",
            Operation::UserApplications { .. } => "Failed to fetch applications",
            Operation::JobApplicants { .. } => "Failed to fetch applicants",
        }
    }

    /// Turn a response body into the operation's records
    ///
    /// The open-jobs listing is paginated and wraps its records in `jobs`;
    /// every other read returns a bare array.
    pub fn decode(&self, body: Value) -> Result<Vec<Record>, FetchError> {
        match self {
            Operation::OpenJobs => {
                let list = match body {
                    Value::Object(mut map) => map
                        .remove("jobs")
                        .ok_or_else(|| FetchError::InvalidResponse("missing 'jobs' field".to_string()))?,
                    other => other,
                };
                decode_list::<Job>(list)
            }
            Operation::MyJobs => decode_list::<Job>(body),
            Operation::UserApplications { .. } | Operation::JobApplicants { .. } => decode_list::<Application>(body),
        }
    }
}

fn decode_list<T>(body: Value) -> Result<Vec<Record>, FetchError>
where
    T: DeserializeOwned + Into<Record>,
{
    if !body.is_array() {
        return Err(FetchError::InvalidResponse("expected a JSON array".to_string()));
    }
    let items: Vec<T> = serde_json::from_value(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
    Ok(items.into_iter().map(Into::into).collect())
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::OpenJobs | Operation::MyJobs => f.write_str(self.name()),
            Operation::UserApplications { user_id } => write!(f, "{}({})", self.name(), user_id),
            Operation::JobApplicants { job_id } => write!(f, "{}({})", self.name(), job_id),
        }
    }
}
