use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier wrapper for the submission a booking attempt belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// One form field relevant to appointment booking: the raw value plus the
/// label the form designer gave it, when any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentField {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AppointmentField {
    /// `null`, `""`, `[]` and `{}` count as unfilled.
    pub fn is_filled(&self) -> bool {
        match &self.value {
            Value::Null => false,
            Value::String(text) => !text.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(members) => !members.is_empty(),
            _ => true,
        }
    }
}

/// Appointment-relevant slice of a submission's merged form data, keyed by
/// the well-known appointment field names. Derived per booking attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentData(pub BTreeMap<String, AppointmentField>);

impl AppointmentData {
    pub fn field(&self, key: &str) -> Option<&AppointmentField> {
        self.0.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key).map(|field| &field.value)
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(AppointmentField::is_filled)
    }
}

/// Product the citizen wants an appointment for, as known by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentProduct {
    pub identifier: String,
    pub name: String,
}

/// Desk or office where the appointment takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentLocation {
    pub identifier: String,
    pub name: String,
}

/// Minimal client identity a provider needs to reserve a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub last_name: String,
    pub birthdate: NaiveDate,
    pub phone_number: Option<String>,
}

/// Result classification of the most recent booking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Success,
    MissingInfo,
    Failed,
    Cancelled,
}

impl AppointmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Success => "success",
            AppointmentStatus::MissingInfo => "missing_info",
            AppointmentStatus::Failed => "failed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}
