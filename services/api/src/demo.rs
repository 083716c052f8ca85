use crate::infra::{provider_registry, InMemoryOutcomeRepository, TracingAuditSink};
use clap::Args;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use loket::config::AppConfig;
use loket::error::AppError;
use loket::telemetry;
use loket::workflows::appointments::{
    AppointmentData, AppointmentField, BookingDisposition, BookingService, SubmissionId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Submission identifier to book under
    #[arg(long, default_value = "demo-submission")]
    pub(crate) submission: String,
    /// Leave out the client's last name to show the missing-info flow
    #[arg(long)]
    pub(crate) omit_last_name: bool,
    /// Cancel the appointment again after booking it
    #[arg(long)]
    pub(crate) cancel: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let registry = provider_registry();
    let provider = registry.resolve(&config.appointments.provider)?;

    let service = BookingService::new(
        Arc::new(InMemoryOutcomeRepository::default()),
        Arc::new(TracingAuditSink),
        provider,
        config.appointments.booking_timeout(),
    );

    println!("Appointment booking demo");
    println!(
        "Provider: {} | submission: {}",
        config.appointments.provider, args.submission
    );

    let submission = SubmissionId(args.submission);
    let data = demo_appointment_data(args.omit_last_name);

    let outcome = match service.book(&submission, &data).await {
        Ok(BookingDisposition::Booked(outcome)) => outcome,
        Ok(BookingDisposition::Skipped) => {
            println!("Submission carried no appointment fields; nothing to do");
            return Ok(());
        }
        Err(err) => {
            println!("Booking aborted: {err}");
            println!("Retry advised: {}", err.should_retry());
            if let Ok(Some(stored)) = service.outcome(&submission) {
                match serde_json::to_string_pretty(&stored.status_view()) {
                    Ok(payload) => println!("Recorded outcome:\n{payload}"),
                    Err(err) => println!("Recorded outcome unavailable: {err}"),
                }
            }
            return Ok(());
        }
    };

    match serde_json::to_string_pretty(&outcome.status_view()) {
        Ok(payload) => println!("Booked:\n{payload}"),
        Err(err) => println!("Booked (payload unavailable: {err})"),
    }

    if args.cancel {
        match service.cancel(&submission).await {
            Ok(cancelled) => println!(
                "Cancelled appointment {}",
                cancelled.appointment_id.as_deref().unwrap_or("-")
            ),
            Err(err) => println!("Cancellation failed: {err}"),
        }
    }

    Ok(())
}

fn demo_appointment_data(omit_last_name: bool) -> AppointmentData {
    let mut fields = BTreeMap::new();
    fields.insert(
        "productIDAndName".to_string(),
        AppointmentField {
            value: json!({"identifier": "79", "name": "Passport application"}),
            label: Some("Product".to_string()),
        },
    );
    fields.insert(
        "locationIDAndName".to_string(),
        AppointmentField {
            value: json!({"identifier": "1", "name": "City office"}),
            label: Some("Location".to_string()),
        },
    );
    fields.insert(
        "appStartTime".to_string(),
        AppointmentField {
            value: json!("2026-09-01T10:30:00+02:00"),
            label: Some("Start time".to_string()),
        },
    );
    fields.insert(
        "clientLastName".to_string(),
        AppointmentField {
            value: if omit_last_name {
                serde_json::Value::Null
            } else {
                json!("Jansen")
            },
            label: Some("Last name".to_string()),
        },
    );
    fields.insert(
        "clientDateOfBirth".to_string(),
        AppointmentField {
            value: json!("1990-08-01"),
            label: Some("Date of birth".to_string()),
        },
    );
    fields.insert(
        "clientPhoneNumber".to_string(),
        AppointmentField {
            value: json!("+31 (20) 753 05 23"),
            label: Some("Phone number".to_string()),
        },
    );
    AppointmentData(fields)
}
