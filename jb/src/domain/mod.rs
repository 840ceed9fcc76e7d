//! Domain records returned by the job board API

mod application;
mod job;
mod refs;

pub use application::{
    Applicant, Application, ApplicationStatus, JobSummary, NewApplication, StatusUpdate, count_by_status,
};
pub use job::{Job, JobType, NewJob, Owner, Salary, format_salary};
pub use refs::{Identified, Ref};

use serde::Serialize;

/// One cached list element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Job(Job),
    Application(Application),
}

impl Record {
    /// Document id of the wrapped record
    pub fn id(&self) -> &str {
        match self {
            Record::Job(job) => &job.id,
            Record::Application(app) => &app.id,
        }
    }

    pub fn as_job(&self) -> Option<&Job> {
        match self {
            Record::Job(job) => Some(job),
            Record::Application(_) => None,
        }
    }

    pub fn as_application(&self) -> Option<&Application> {
        match self {
            Record::Application(app) => Some(app),
            Record::Job(_) => None,
        }
    }
}

impl From<Job> for Record {
    fn from(job: Job) -> Self {
        Record::Job(job)
    }
}

impl From<Application> for Record {
    fn from(app: Application) -> Self {
        Record::Application(app)
    }
}
