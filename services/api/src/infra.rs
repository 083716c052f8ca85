use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use loket::workflows::appointments::{
    AppointmentLocation, AppointmentOutcome, AppointmentProduct, AppointmentProvider, AuditSink,
    ClientDetails, CreateAppointmentError, DeleteAppointmentError, OutcomeRepository,
    ProviderRegistry, RepositoryError, SubmissionId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOutcomeRepository {
    records: Arc<Mutex<HashMap<SubmissionId, AppointmentOutcome>>>,
}

impl OutcomeRepository for InMemoryOutcomeRepository {
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

/// Audit sink that writes booking lifecycle events to the tracing pipeline.
#[derive(Default, Clone)]
pub(crate) struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn registration_start(&self, submission: &SubmissionId, plugin_id: &str) {
        info!(submission = %submission.0, plugin = plugin_id, "appointment registration started");
    }

    fn registration_skip(&self, submission: &SubmissionId, missing_labels: &[String]) {
        warn!(
            submission = %submission.0,
            missing = %missing_labels.join(", "),
            "appointment registration skipped: incomplete information"
        );
    }

    fn registration_success(&self, outcome: &AppointmentOutcome, plugin_id: &str) {
        info!(
            submission = %outcome.submission_id.0,
            plugin = plugin_id,
            appointment_id = outcome.appointment_id.as_deref().unwrap_or("-"),
            "appointment registered"
        );
    }

    fn registration_failure(
        &self,
        outcome: &AppointmentOutcome,
        plugin_id: &str,
        error: &CreateAppointmentError,
    ) {
        warn!(
            submission = %outcome.submission_id.0,
            plugin = plugin_id,
            error = %error,
            "appointment registration failed"
        );
    }

    fn cancellation_start(&self, submission: &SubmissionId, plugin_id: &str) {
        info!(submission = %submission.0, plugin = plugin_id, "appointment cancellation started");
    }

    fn cancellation_success(&self, outcome: &AppointmentOutcome, plugin_id: &str) {
        info!(
            submission = %outcome.submission_id.0,
            plugin = plugin_id,
            appointment_id = outcome.appointment_id.as_deref().unwrap_or("-"),
            "appointment cancelled"
        );
    }

    fn cancellation_failure(
        &self,
        submission: &SubmissionId,
        plugin_id: &str,
        error: &DeleteAppointmentError,
    ) {
        warn!(
            submission = %submission.0,
            plugin = plugin_id,
            error = %error,
            "appointment cancellation failed"
        );
    }
}

/// Stand-in provider that books every slot it is asked for. Real agenda
/// integrations register here the same way.
#[derive(Default)]
pub(crate) struct DemoProvider {
    sequence: AtomicU64,
}

#[async_trait]
impl AppointmentProvider for DemoProvider {
    fn plugin_id(&self) -> &'static str {
        "demo"
    }

    async fn create_appointment(
        &self,
        products: &[AppointmentProduct],
        location: &AppointmentLocation,
        start_at: DateTime<FixedOffset>,
        client: &ClientDetails,
    ) -> Result<String, CreateAppointmentError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            product = products.first().map(|p| p.name.as_str()).unwrap_or("-"),
            location = location.name.as_str(),
            %start_at,
            client = client.last_name.as_str(),
            "demo provider reserved a slot"
        );
        Ok(format!("demo-{id:06}"))
    }

    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), DeleteAppointmentError> {
        info!(appointment_id, "demo provider released a slot");
        Ok(())
    }
}

/// All providers this deployment knows about, keyed by plugin id.
pub(crate) fn provider_registry() -> ProviderRegistry {
    ProviderRegistry::new().register(Arc::new(DemoProvider::default()))
}
