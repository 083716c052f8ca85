//! Appointment booking orchestration for form submissions.
//!
//! A submitted form may carry the well-known appointment fields; when it
//! does, the booking service validates their completeness, hands the typed
//! values to the configured provider plugin, and records the outcome so
//! callers know whether to retry. Provider implementations live behind
//! [`provider::AppointmentProvider`]; only the contract is defined here.

pub(crate) mod completeness;
pub mod domain;
pub(crate) mod extract;
pub mod provider;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use completeness::{assess, missing_field_labels, missing_info_message, Completeness};
pub use domain::{
    AppointmentData, AppointmentField, AppointmentLocation, AppointmentProduct, AppointmentStatus,
    ClientDetails, SubmissionId,
};
pub use extract::{booking_request, format_phone_number, BookingRequest, ExtractionError};
pub use provider::{
    AppointmentProvider, CreateAppointmentError, DeleteAppointmentError, ProviderRegistry,
    RegistryError,
};
pub use repository::{
    AppointmentOutcome, AuditSink, OutcomeRepository, OutcomeView, RepositoryError,
};
pub use router::appointment_router;
pub use service::{BookingDisposition, BookingError, BookingService, CancelError};
