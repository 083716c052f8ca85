use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::domain::{AppointmentStatus, SubmissionId};
use super::provider::{CreateAppointmentError, DeleteAppointmentError};

/// Persisted record of the most recent booking attempt for a submission.
/// Exactly one exists per submission at any time; a new attempt replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentOutcome {
    pub submission_id: SubmissionId,
    pub status: AppointmentStatus,
    pub appointment_id: Option<String>,
    pub error_information: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
}

impl AppointmentOutcome {
    pub fn status_view(&self) -> OutcomeView {
        OutcomeView {
            submission_id: self.submission_id.clone(),
            status: self.status.label(),
            appointment_id: self.appointment_id.clone(),
            start_time: self.start_time,
            error_information: self.error_information.clone(),
        }
    }
}

/// Sanitized representation of an outcome for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeView {
    pub submission_id: SubmissionId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_information: Option<String>,
}

/// Storage abstraction so the service module can be exercised in isolation.
/// `replace` is an upsert; `delete` is a no-op for unknown submissions.
pub trait OutcomeRepository: Send + Sync {
    fn replace(&self, outcome: AppointmentOutcome) -> Result<AppointmentOutcome, RepositoryError>;
    fn fetch(&self, id: &SubmissionId) -> Result<Option<AppointmentOutcome>, RepositoryError>;
    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError>;
}

/// Error enumeration for outcome store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("outcome store unavailable: {0}")]
    Unavailable(String),
}

/// Trail of booking lifecycle events. Implementations must be fire-and-forget:
/// a sink may drop events but must never fail or block the booking flow.
/// Raw provider errors only ever surface here, never in stored outcomes.
pub trait AuditSink: Send + Sync {
    fn registration_start(&self, submission: &SubmissionId, plugin_id: &str);
    fn registration_skip(&self, submission: &SubmissionId, missing_labels: &[String]);
    fn registration_success(&self, outcome: &AppointmentOutcome, plugin_id: &str);
    fn registration_failure(
        &self,
        outcome: &AppointmentOutcome,
        plugin_id: &str,
        error: &CreateAppointmentError,
    );
    fn cancellation_start(&self, submission: &SubmissionId, plugin_id: &str);
    fn cancellation_success(&self, outcome: &AppointmentOutcome, plugin_id: &str);
    fn cancellation_failure(
        &self,
        submission: &SubmissionId,
        plugin_id: &str,
        error: &DeleteAppointmentError,
    );
}
