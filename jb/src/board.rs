//! JobBoard session: coordinator lifecycle plus mutations

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::{CoordinatorHandle, FetchConfig, FetchCoordinator, FetchMetrics, Operation};
use crate::domain::{Application, ApplicationStatus, Job, NewApplication, NewJob, Record, StatusUpdate};
use crate::notify::{Notification, Notifier};
use crate::transport::{FetchError, Transport, WriteMethod};

/// A running client session
///
/// Owns the coordinator task. Reads go through [`JobBoard::handle`]; writes go
/// straight to the transport and then patch or refresh the affected cache
/// entries.
pub struct JobBoard {
    handle: CoordinatorHandle,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    task: Option<JoinHandle<()>>,
}

impl JobBoard {
    /// Spawn the coordinator and return the session
    pub fn start(config: FetchConfig, transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        debug!("JobBoard::start: called");
        let coordinator = FetchCoordinator::new(config, transport.clone(), notifier.clone());
        let handle = coordinator.handle();
        let task = tokio::spawn(coordinator.run());
        Self {
            handle,
            transport,
            notifier,
            task: Some(task),
        }
    }

    /// Handle for consumers of shared list data
    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Post a job and put it at the front of the employer's list
    pub async fn create_job(&self, job: &NewJob) -> Result<Job, FetchError> {
        debug!(title = %job.title, "JobBoard::create_job: called");
        let body = self
            .write(
                WriteMethod::Post,
                "/api/jobs",
                Some(encode(job)?),
                "Failed to create job",
            )
            .await?;
        let created: Job = self.decode(body, "Failed to create job")?;

        self.prepend(Operation::MyJobs, created.clone().into()).await;
        self.notifier.notify(Notification::success("Job created successfully!"));
        Ok(created)
    }

    /// Submit an application and put it at the front of the applicant's list
    pub async fn apply_for_job(&self, application: &NewApplication) -> Result<Application, FetchError> {
        debug!(job_id = %application.job_id, "JobBoard::apply_for_job: called");
        let body = self
            .write(
                WriteMethod::Post,
                "/api/applications",
                Some(encode(application)?),
                "Failed to submit application",
            )
            .await?;
        let created: Application = self.decode(body, "Failed to submit application")?;

        let operation = Operation::UserApplications {
            user_id: created.user.id().to_string(),
        };
        self.prepend(operation, created.clone().into()).await;
        self.notifier.notify(Notification::success("Application submitted successfully!"));
        Ok(created)
    }

    /// Delete a job, then refresh the employer's list
    pub async fn delete_job(&self, job_id: &str) -> Result<(), FetchError> {
        debug!(%job_id, "JobBoard::delete_job: called");
        self.write(
            WriteMethod::Delete,
            &format!("/api/jobs/{}", urlencoding::encode(job_id)),
            None,
            "Failed to delete job",
        )
        .await?;
        self.notifier.notify(Notification::success("Job deleted successfully"));

        if let Err(e) = self.handle.refresh(Operation::MyJobs).await {
            warn!(error = %e, "Could not refresh jobs after delete");
        }
        Ok(())
    }

    /// Record a review decision, then refresh the job's applicants
    pub async fn update_application_status(
        &self,
        application_id: &str,
        job_id: &str,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application, FetchError> {
        debug!(%application_id, %job_id, %status, "JobBoard::update_application_status: called");
        let update = StatusUpdate { status, notes };
        let body = self
            .write(
                WriteMethod::Put,
                &format!("/api/applications/{}/status", urlencoding::encode(application_id)),
                Some(encode(&update)?),
                "Failed to update application",
            )
            .await?;
        let updated: Application = self.decode(body, "Failed to update application")?;
        self.notifier.notify(Notification::success("Application status updated"));

        let operation = Operation::JobApplicants {
            job_id: job_id.to_string(),
        };
        if let Err(e) = self.handle.refresh(operation).await {
            warn!(error = %e, "Could not refresh applicants after status update");
        }
        Ok(updated)
    }

    /// Fetch a single job; not cached
    pub async fn job(&self, job_id: &str) -> Result<Job, FetchError> {
        debug!(%job_id, "JobBoard::job: called");
        let body = self
            .transport
            .read(&format!("/api/jobs/{}", urlencoding::encode(job_id)), CancellationToken::new())
            .await?;
        serde_json::from_value(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    /// Tear the coordinator down and wait for it to stop
    pub async fn shutdown(mut self) -> eyre::Result<FetchMetrics> {
        debug!("JobBoard::shutdown: called");
        let metrics = self.handle.teardown().await?;
        if let Some(task) = self.task.take() {
            task.await?;
        }
        info!(
            attempts = metrics.attempts_issued,
            succeeded = metrics.succeeded,
            failed = metrics.failed,
            "JobBoard stopped"
        );
        Ok(metrics)
    }

    /// Send a write; callers announce success once the body has been used
    async fn write(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<Value>,
        fallback: &str,
    ) -> Result<Value, FetchError> {
        self.transport.write(method, path, body).await.map_err(|e| {
            warn!(?method, %path, error = %e, "Write failed");
            self.notifier.notify(Notification::error(e.user_message(fallback)));
            e
        })
    }

    fn decode<T: DeserializeOwned>(&self, body: Value, fallback: &str) -> Result<T, FetchError> {
        serde_json::from_value(body).map_err(|e| {
            warn!(error = %e, "Unexpected response body");
            self.notifier.notify(Notification::error(fallback));
            FetchError::InvalidResponse(e.to_string())
        })
    }

    async fn prepend(&self, operation: Operation, record: Record) {
        if let Err(e) = self.handle.prepend(operation, record).await {
            warn!(error = %e, "Could not update cache after write");
        }
    }
}

impl Drop for JobBoard {
    fn drop(&mut self) {
        if self.task.is_none() {
            return;
        }
        if self.handle.try_teardown() {
            debug!("JobBoard::drop: sent teardown");
        } else {
            // The coordinator still stops once its last handle and read are gone
            warn!("JobBoard::drop: could not send teardown, coordinator queue is full or closed");
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, FetchError> {
    serde_json::to_value(value).map_err(|e| FetchError::InvalidResponse(e.to_string()))
}
