use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};

use crate::workflows::appointments::domain::{
    AppointmentData, AppointmentField, AppointmentLocation, AppointmentProduct, ClientDetails,
    SubmissionId,
};
use crate::workflows::appointments::provider::{
    AppointmentProvider, CreateAppointmentError, DeleteAppointmentError,
};
use crate::workflows::appointments::repository::{
    AppointmentOutcome, AuditSink, OutcomeRepository, RepositoryError,
};
use crate::workflows::appointments::router::appointment_router;
use crate::workflows::appointments::service::BookingService;

pub(super) fn field(value: Value) -> AppointmentField {
    AppointmentField { value, label: None }
}

pub(super) fn labeled_field(value: Value, label: &str) -> AppointmentField {
    AppointmentField {
        value,
        label: Some(label.to_string()),
    }
}

pub(super) fn submission() -> SubmissionId {
    SubmissionId("sub-001".to_string())
}

pub(super) fn expected_start() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-08-25T17:00:00+02:00").expect("valid start timestamp")
}

/// Every required field filled, plus a phone number.
pub(super) fn complete_data() -> AppointmentData {
    let mut fields = BTreeMap::new();
    fields.insert(
        "productIDAndName".to_string(),
        labeled_field(
            json!({"identifier": "79", "name": "Paspoort aanvraag"}),
            "Product",
        ),
    );
    fields.insert(
        "locationIDAndName".to_string(),
        labeled_field(json!({"identifier": "1", "name": "Stadskantoor"}), "Location"),
    );
    fields.insert(
        "appStartTime".to_string(),
        labeled_field(json!("2026-08-25T17:00:00+02:00"), "Start time"),
    );
    fields.insert(
        "clientLastName".to_string(),
        labeled_field(json!("Jansen"), "Last name"),
    );
    fields.insert(
        "clientDateOfBirth".to_string(),
        labeled_field(json!("1990-08-01"), "Date of birth"),
    );
    fields.insert(
        "clientPhoneNumber".to_string(),
        field(json!("+31 20 753 05 23")),
    );
    AppointmentData(fields)
}

/// No appointment fields at all: the form never asked for one.
pub(super) fn no_intent_data() -> AppointmentData {
    AppointmentData::default()
}

/// Appointment fields present in the form but none filled in.
pub(super) fn untouched_data() -> AppointmentData {
    let mut fields = BTreeMap::new();
    for key in [
        "productIDAndName",
        "locationIDAndName",
        "appStartTime",
        "clientLastName",
        "clientDateOfBirth",
    ] {
        fields.insert(key.to_string(), field(Value::Null));
    }
    AppointmentData(fields)
}

/// Product and location filled; start time empty but labeled, last name
/// empty without a label, birth date absent entirely.
pub(super) fn partial_data() -> AppointmentData {
    let mut fields = BTreeMap::new();
    fields.insert(
        "productIDAndName".to_string(),
        labeled_field(
            json!({"identifier": "79", "name": "Paspoort aanvraag"}),
            "Product",
        ),
    );
    fields.insert(
        "locationIDAndName".to_string(),
        labeled_field(json!({"identifier": "1", "name": "Stadskantoor"}), "Location"),
    );
    fields.insert(
        "appStartTime".to_string(),
        labeled_field(json!(""), "Start time"),
    );
    fields.insert("clientLastName".to_string(), field(Value::Null));
    AppointmentData(fields)
}

pub(super) const EXPECTED_MISSING_LABELS: [&str; 3] =
    ["Start time", "clientDateOfBirth", "clientLastName"];

#[derive(Debug, Clone, PartialEq)]
pub(super) struct CreateCall {
    pub(super) products: Vec<AppointmentProduct>,
    pub(super) location: AppointmentLocation,
    pub(super) start_at: DateTime<FixedOffset>,
    pub(super) client: ClientDetails,
}

/// Provider double that books everything and records what it saw.
#[derive(Default)]
pub(super) struct StubProvider {
    sequence: AtomicU64,
    pub(super) created: Mutex<Vec<CreateCall>>,
    pub(super) deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl AppointmentProvider for StubProvider {
    fn plugin_id(&self) -> &'static str {
        "stub"
    }

    async fn create_appointment(
        &self,
        products: &[AppointmentProduct],
        location: &AppointmentLocation,
        start_at: DateTime<FixedOffset>,
        client: &ClientDetails,
    ) -> Result<String, CreateAppointmentError> {
        self.created.lock().expect("call log poisoned").push(CreateCall {
            products: products.to_vec(),
            location: location.clone(),
            start_at,
            client: client.clone(),
        });
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("stub-{id:06}"))
    }

    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), DeleteAppointmentError> {
        self.deleted
            .lock()
            .expect("call log poisoned")
            .push(appointment_id.to_string());
        Ok(())
    }
}

/// Provider double that cannot book anything.
pub(super) struct RefusingProvider;

#[async_trait]
impl AppointmentProvider for RefusingProvider {
    fn plugin_id(&self) -> &'static str {
        "refusing"
    }

    async fn create_appointment(
        &self,
        _products: &[AppointmentProduct],
        _location: &AppointmentLocation,
        _start_at: DateTime<FixedOffset>,
        _client: &ClientDetails,
    ) -> Result<String, CreateAppointmentError> {
        Err(CreateAppointmentError::Rejected("agenda closed".to_string()))
    }

    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), DeleteAppointmentError> {
        Err(DeleteAppointmentError::Refused {
            appointment_id: appointment_id.to_string(),
            reason: "agenda closed".to_string(),
        })
    }
}

/// Provider double that never answers, to exercise the call timeout.
pub(super) struct StallingProvider;

#[async_trait]
impl AppointmentProvider for StallingProvider {
    fn plugin_id(&self) -> &'static str {
        "stalling"
    }

    async fn create_appointment(
        &self,
        _products: &[AppointmentProduct],
        _location: &AppointmentLocation,
        _start_at: DateTime<FixedOffset>,
        _client: &ClientDetails,
    ) -> Result<String, CreateAppointmentError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Err(CreateAppointmentError::Unreachable("never reached".to_string()))
    }

    async fn delete_appointment(&self, _appointment_id: &str) -> Result<(), DeleteAppointmentError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Err(DeleteAppointmentError::Unreachable("never reached".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryOutcomes {
    records: Arc<Mutex<HashMap<SubmissionId, AppointmentOutcome>>>,
}

impl MemoryOutcomes {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }

    pub(super) fn stored(&self, id: &SubmissionId) -> Option<AppointmentOutcome> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl OutcomeRepository for MemoryOutcomes {
    fn replace(&self, outcome: AppointmentOutcome) -> Result<AppointmentOutcome, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(outcome.submission_id.clone(), outcome.clone());
        Ok(outcome)
    }

    fn fetch(&self, id: &SubmissionId) -> Result<Option<AppointmentOutcome>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &SubmissionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id);
        Ok(())
    }
}

/// Repository double standing in for an offline store.
pub(super) struct UnavailableOutcomes;

impl OutcomeRepository for UnavailableOutcomes {
    fn replace(&self, _outcome: AppointmentOutcome) -> Result<AppointmentOutcome, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SubmissionId) -> Result<Option<AppointmentOutcome>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &SubmissionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum AuditEvent {
    Start(String),
    Skip(Vec<String>),
    Success(Option<String>),
    Failure(String),
    CancelStart(String),
    CancelSuccess(Option<String>),
    CancelFailure(String),
}

#[derive(Default, Clone)]
pub(super) struct RecordingAudit {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingAudit {
    pub(super) fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }

    fn push(&self, event: AuditEvent) {
        self.events.lock().expect("audit mutex poisoned").push(event);
    }
}

impl AuditSink for RecordingAudit {
    fn registration_start(&self, _submission: &SubmissionId, plugin_id: &str) {
        self.push(AuditEvent::Start(plugin_id.to_string()));
    }

    fn registration_skip(&self, _submission: &SubmissionId, missing_labels: &[String]) {
        self.push(AuditEvent::Skip(missing_labels.to_vec()));
    }

    fn registration_success(&self, outcome: &AppointmentOutcome, _plugin_id: &str) {
        self.push(AuditEvent::Success(outcome.appointment_id.clone()));
    }

    fn registration_failure(
        &self,
        _outcome: &AppointmentOutcome,
        _plugin_id: &str,
        error: &CreateAppointmentError,
    ) {
        self.push(AuditEvent::Failure(error.to_string()));
    }

    fn cancellation_start(&self, _submission: &SubmissionId, plugin_id: &str) {
        self.push(AuditEvent::CancelStart(plugin_id.to_string()));
    }

    fn cancellation_success(&self, outcome: &AppointmentOutcome, _plugin_id: &str) {
        self.push(AuditEvent::CancelSuccess(outcome.appointment_id.clone()));
    }

    fn cancellation_failure(
        &self,
        _submission: &SubmissionId,
        _plugin_id: &str,
        error: &DeleteAppointmentError,
    ) {
        self.push(AuditEvent::CancelFailure(error.to_string()));
    }
}

pub(super) fn build_service(
    provider: Arc<dyn AppointmentProvider>,
) -> (
    Arc<BookingService<MemoryOutcomes, RecordingAudit>>,
    Arc<MemoryOutcomes>,
    Arc<RecordingAudit>,
) {
    build_service_with_timeout(provider, Duration::from_secs(5))
}

pub(super) fn build_service_with_timeout(
    provider: Arc<dyn AppointmentProvider>,
    call_timeout: Duration,
) -> (
    Arc<BookingService<MemoryOutcomes, RecordingAudit>>,
    Arc<MemoryOutcomes>,
    Arc<RecordingAudit>,
) {
    let repository = Arc::new(MemoryOutcomes::default());
    let audit = Arc::new(RecordingAudit::default());
    let service = Arc::new(BookingService::new(
        repository.clone(),
        audit.clone(),
        provider,
        call_timeout,
    ));
    (service, repository, audit)
}

pub(super) fn appointment_router_with_service(
    service: Arc<BookingService<MemoryOutcomes, RecordingAudit>>,
) -> axum::Router {
    appointment_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
