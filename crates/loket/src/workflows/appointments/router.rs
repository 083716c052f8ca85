use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::domain::{AppointmentData, SubmissionId};
use super::repository::{AuditSink, OutcomeRepository};
use super::service::{BookingDisposition, BookingError, BookingService, CancelError};

/// Router builder exposing HTTP endpoints for booking, outcome lookup, and
/// cancellation.
pub fn appointment_router<R, S>(service: Arc<BookingService<R, S>>) -> Router
where
    R: OutcomeRepository + 'static,
    S: AuditSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/submissions/:submission_id/appointment",
            post(book_handler::<R, S>)
                .get(outcome_handler::<R, S>)
                .delete(cancel_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn book_handler<R, S>(
    State(service): State<Arc<BookingService<R, S>>>,
    Path(submission_id): Path<String>,
    axum::Json(data): axum::Json<AppointmentData>,
) -> Response
where
    R: OutcomeRepository + 'static,
    S: AuditSink + 'static,
{
    let id = SubmissionId(submission_id);
    match service.book(&id, &data).await {
        Ok(BookingDisposition::Booked(outcome)) => {
            (StatusCode::CREATED, axum::Json(outcome.status_view())).into_response()
        }
        Ok(BookingDisposition::Skipped) => {
            let payload = json!({
                "submission_id": id.0,
                "status": "skipped",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(BookingError::MissingInformation {
            error_information,
            missing_labels,
        }) => {
            let payload = json!({
                "error": error_information,
                "missing_fields": missing_labels,
                "retry": false,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(BookingError::CreateFailed(_)) => {
            let payload = json!({
                "error": "Failed to make appointment",
                "retry": true,
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        Err(BookingError::Extraction(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn outcome_handler<R, S>(
    State(service): State<Arc<BookingService<R, S>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    R: OutcomeRepository + 'static,
    S: AuditSink + 'static,
{
    let id = SubmissionId(submission_id);
    match service.outcome(&id) {
        Ok(Some(outcome)) => (StatusCode::OK, axum::Json(outcome.status_view())).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": "no appointment outcome for this submission",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn cancel_handler<R, S>(
    State(service): State<Arc<BookingService<R, S>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    R: OutcomeRepository + 'static,
    S: AuditSink + 'static,
{
    let id = SubmissionId(submission_id);
    match service.cancel(&id).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome.status_view())).into_response(),
        Err(CancelError::NotBooked) => {
            let payload = json!({
                "error": CancelError::NotBooked.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(CancelError::DeleteFailed(_)) => {
            let payload = json!({
                "error": "Failed to cancel appointment",
                "retry": true,
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
