use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use super::domain::{AppointmentLocation, AppointmentProduct, ClientDetails};

/// Error a provider raises when a booking cannot be completed. Every variant
/// is treated as a retryable booking failure by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum CreateAppointmentError {
    #[error("provider rejected the booking: {0}")]
    Rejected(String),
    #[error("provider unreachable: {0}")]
    Unreachable(String),
    #[error("provider did not answer within {seconds}s")]
    TimedOut { seconds: u64 },
}

/// Error a provider raises when an existing appointment cannot be cancelled.
#[derive(Debug, thiserror::Error)]
pub enum DeleteAppointmentError {
    #[error("provider refused to cancel appointment '{appointment_id}': {reason}")]
    Refused {
        appointment_id: String,
        reason: String,
    },
    #[error("provider unreachable: {0}")]
    Unreachable(String),
    #[error("provider did not answer within {seconds}s")]
    TimedOut { seconds: u64 },
}

/// Capability implemented by each appointment provider plugin (JCC-style
/// agenda systems and the like). Implementations own their transport and
/// credentials; the orchestrator only sees this contract.
#[async_trait]
pub trait AppointmentProvider: Send + Sync {
    /// Stable identifier used for registry lookup and audit events.
    fn plugin_id(&self) -> &'static str;

    /// Reserve a slot and return the provider-side appointment identifier.
    async fn create_appointment(
        &self,
        products: &[AppointmentProduct],
        location: &AppointmentLocation,
        start_at: DateTime<FixedOffset>,
        client: &ClientDetails,
    ) -> Result<String, CreateAppointmentError>;

    /// Release a previously reserved slot.
    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), DeleteAppointmentError>;
}

/// Error raised when the configured provider id cannot be resolved.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no appointment provider registered under '{id}' (registered: {registered})")]
    UnknownProvider { id: String, registered: String },
}

/// Typed mapping from plugin id to provider implementation. Built once at
/// startup; the resolved provider is injected into the orchestrator instead
/// of being looked up per booking attempt.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn AppointmentProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own plugin id. Later registrations for
    /// the same id win.
    pub fn register(mut self, provider: Arc<dyn AppointmentProvider>) -> Self {
        self.providers
            .insert(provider.plugin_id().to_string(), provider);
        self
    }

    pub fn resolve(&self, id: &str) -> Result<Arc<dyn AppointmentProvider>, RegistryError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownProvider {
                id: id.to_string(),
                registered: self
                    .providers
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn plugin_ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}
