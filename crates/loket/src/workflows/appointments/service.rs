use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use super::completeness::{self, Completeness};
use super::domain::{AppointmentData, AppointmentStatus, SubmissionId};
use super::extract::{self, ExtractionError};
use super::provider::{AppointmentProvider, CreateAppointmentError, DeleteAppointmentError};
use super::repository::{AppointmentOutcome, AuditSink, OutcomeRepository, RepositoryError};

/// What a booking attempt did for submissions that completed normally.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingDisposition {
    /// The submission never intended to book an appointment; nothing was
    /// recorded.
    Skipped,
    Booked(AppointmentOutcome),
}

/// Registration-failed signal raised by [`BookingService::book`]. Callers
/// re-enqueue the attempt only when [`BookingError::should_retry`] says so.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("no registration attempted because of incomplete information")]
    MissingInformation {
        error_information: String,
        missing_labels: Vec<String>,
    },
    #[error("unable to create appointment")]
    CreateFailed(#[source] CreateAppointmentError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl BookingError {
    /// Missing information is terminal until the citizen resubmits;
    /// extraction and storage faults indicate defects. Only a provider
    /// booking failure warrants another attempt with the same data.
    pub fn should_retry(&self) -> bool {
        matches!(self, BookingError::CreateFailed(_))
    }
}

/// Error raised by [`BookingService::cancel`].
#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    #[error("submission has no booked appointment to cancel")]
    NotBooked,
    #[error("unable to cancel appointment")]
    DeleteFailed(#[source] DeleteAppointmentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Orchestrates one booking attempt per submission: validate completeness,
/// delegate to the resolved provider, record the outcome.
pub struct BookingService<R, S> {
    repository: Arc<R>,
    audit: Arc<S>,
    provider: Arc<dyn AppointmentProvider>,
    call_timeout: Duration,
    // Serializes outcome replacement per submission; attempts on different
    // submissions proceed independently.
    in_flight: Mutex<HashMap<SubmissionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<R, S> BookingService<R, S>
where
    R: OutcomeRepository + 'static,
    S: AuditSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        audit: Arc<S>,
        provider: Arc<dyn AppointmentProvider>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            audit,
            provider,
            call_timeout,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn plugin_id(&self) -> &'static str {
        self.provider.plugin_id()
    }

    fn submission_lock(&self, submission_id: &SubmissionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut table = self.in_flight.lock().expect("lock table mutex poisoned");
        table
            .entry(submission_id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Attempt to book an appointment for a submission. Callable repeatedly;
    /// any outcome of an earlier attempt is replaced, never accumulated.
    pub async fn book(
        &self,
        submission_id: &SubmissionId,
        data: &AppointmentData,
    ) -> Result<BookingDisposition, BookingError> {
        let lock = self.submission_lock(submission_id);
        let _guard = lock.lock().await;

        // A previous attempt may have left an outcome behind; this attempt
        // starts clean.
        self.repository.delete(submission_id)?;

        match completeness::assess(data) {
            Completeness::NotIntended => return Ok(BookingDisposition::Skipped),
            Completeness::Incomplete { missing } => {
                let labels = completeness::missing_field_labels(data, &missing);
                self.audit.registration_skip(submission_id, &labels);

                let error_information = completeness::missing_info_message(&labels);
                self.repository.replace(AppointmentOutcome {
                    submission_id: submission_id.clone(),
                    status: AppointmentStatus::MissingInfo,
                    appointment_id: None,
                    error_information: Some(error_information.clone()),
                    start_time: None,
                })?;

                return Err(BookingError::MissingInformation {
                    error_information,
                    missing_labels: labels,
                });
            }
            Completeness::Complete => {}
        }

        let request = extract::booking_request(data)?;

        self.audit
            .registration_start(submission_id, self.provider.plugin_id());

        let created = timeout(
            self.call_timeout,
            self.provider.create_appointment(
                &request.products,
                &request.location,
                request.start_at,
                &request.client,
            ),
        )
        .await
        .unwrap_or(Err(CreateAppointmentError::TimedOut {
            seconds: self.call_timeout.as_secs(),
        }));

        match created {
            Ok(appointment_id) => {
                let outcome = self.repository.replace(AppointmentOutcome {
                    submission_id: submission_id.clone(),
                    status: AppointmentStatus::Success,
                    appointment_id: Some(appointment_id),
                    error_information: None,
                    start_time: Some(request.start_at),
                })?;
                self.audit
                    .registration_success(&outcome, self.provider.plugin_id());
                Ok(BookingDisposition::Booked(outcome))
            }
            Err(error) => {
                // The stored record carries a generic message; the raw
                // provider error stays in the audit trail.
                let outcome = self.repository.replace(AppointmentOutcome {
                    submission_id: submission_id.clone(),
                    status: AppointmentStatus::Failed,
                    appointment_id: None,
                    error_information: Some("Failed to make appointment".to_string()),
                    start_time: None,
                })?;
                self.audit
                    .registration_failure(&outcome, self.provider.plugin_id(), &error);
                Err(BookingError::CreateFailed(error))
            }
        }
    }

    /// Cancel a previously booked appointment and mark its outcome
    /// `cancelled`. Only submissions whose latest attempt succeeded hold a
    /// reservation the provider knows about.
    pub async fn cancel(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<AppointmentOutcome, CancelError> {
        let lock = self.submission_lock(submission_id);
        let _guard = lock.lock().await;

        let Some(mut outcome) = self.repository.fetch(submission_id)? else {
            return Err(CancelError::NotBooked);
        };
        let appointment_id = match (outcome.status, outcome.appointment_id.as_deref()) {
            (AppointmentStatus::Success, Some(id)) => id.to_string(),
            _ => return Err(CancelError::NotBooked),
        };

        self.audit
            .cancellation_start(submission_id, self.provider.plugin_id());

        let deleted = timeout(
            self.call_timeout,
            self.provider.delete_appointment(&appointment_id),
        )
        .await
        .unwrap_or(Err(DeleteAppointmentError::TimedOut {
            seconds: self.call_timeout.as_secs(),
        }));

        match deleted {
            Ok(()) => {
                outcome.status = AppointmentStatus::Cancelled;
                let outcome = self.repository.replace(outcome)?;
                self.audit
                    .cancellation_success(&outcome, self.provider.plugin_id());
                Ok(outcome)
            }
            Err(error) => {
                self.audit
                    .cancellation_failure(submission_id, self.provider.plugin_id(), &error);
                Err(CancelError::DeleteFailed(error))
            }
        }
    }

    /// Stored outcome of the most recent attempt, for API responses.
    pub fn outcome(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Option<AppointmentOutcome>, RepositoryError> {
        self.repository.fetch(submission_id)
    }
}
