use super::domain::AppointmentData;
use super::extract::REQUIRED_FIELDS;

/// Booking intent derived from which required fields carry a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completeness {
    /// Every required field is absent or empty; the submission never meant
    /// to book an appointment.
    NotIntended,
    /// Some required fields carry a value, others do not. `missing` holds
    /// the raw field keys.
    Incomplete { missing: Vec<String> },
    Complete,
}

pub fn assess(data: &AppointmentData) -> Completeness {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|key| !data.has_value(key))
        .map(|key| key.to_string())
        .collect();

    if missing.len() == REQUIRED_FIELDS.len() {
        Completeness::NotIntended
    } else if missing.is_empty() {
        Completeness::Complete
    } else {
        Completeness::Incomplete { missing }
    }
}

/// Resolve missing field keys to their declared labels, falling back to the
/// raw key when a field carries no (or an empty) label. Sorted for stable,
/// user-presentable output.
pub fn missing_field_labels(data: &AppointmentData, missing: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = missing
        .iter()
        .map(|key| {
            data.field(key)
                .and_then(|field| field.label.as_deref())
                .filter(|label| !label.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| key.clone())
        })
        .collect();
    labels.sort();
    labels
}

/// User-facing message stored on a `missing_info` outcome.
pub fn missing_info_message(labels: &[String]) -> String {
    format!(
        "The following appointment fields should be filled out: {}",
        labels.join(", ")
    )
}
