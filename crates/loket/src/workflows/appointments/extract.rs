use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::Value;

use super::domain::{AppointmentData, AppointmentLocation, AppointmentProduct, ClientDetails};

pub(crate) const PRODUCT_FIELD: &str = "productIDAndName";
pub(crate) const LOCATION_FIELD: &str = "locationIDAndName";
pub(crate) const START_TIME_FIELD: &str = "appStartTime";
pub(crate) const LAST_NAME_FIELD: &str = "clientLastName";
pub(crate) const BIRTH_DATE_FIELD: &str = "clientDateOfBirth";
pub(crate) const PHONE_FIELD: &str = "clientPhoneNumber";

/// Fields a submission must fill before a booking is attempted. The phone
/// number is deliberately not part of this set.
pub(crate) const REQUIRED_FIELDS: [&str; 5] = [
    PRODUCT_FIELD,
    LOCATION_FIELD,
    START_TIME_FIELD,
    LAST_NAME_FIELD,
    BIRTH_DATE_FIELD,
];

const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";
const START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

const PHONE_NUMBER_MAX_LEN: usize = 16;

/// Error raised when present field values do not have the agreed shape.
/// These indicate broken form configuration, not a business outcome.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("field '{field}' should hold {expected}")]
    MalformedValue {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field '{field}' does not parse as '{format}'")]
    InvalidTimestamp {
        field: &'static str,
        format: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

/// Everything the provider call needs, extracted and typed.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub products: Vec<AppointmentProduct>,
    pub location: AppointmentLocation,
    pub start_at: DateTime<FixedOffset>,
    pub client: ClientDetails,
}

/// Build a typed booking request from appointment data that already passed
/// the completeness check.
pub fn booking_request(data: &AppointmentData) -> Result<BookingRequest, ExtractionError> {
    let (identifier, name) = reference_value(data, PRODUCT_FIELD)?;
    let product = AppointmentProduct { identifier, name };

    let (identifier, name) = reference_value(data, LOCATION_FIELD)?;
    let location = AppointmentLocation { identifier, name };

    let start_at = DateTime::<FixedOffset>::parse_from_str(
        string_value(data, START_TIME_FIELD)?,
        START_TIME_FORMAT,
    )
    .map_err(|source| ExtractionError::InvalidTimestamp {
        field: START_TIME_FIELD,
        format: START_TIME_FORMAT,
        source,
    })?;

    let birthdate = NaiveDate::parse_from_str(string_value(data, BIRTH_DATE_FIELD)?, BIRTH_DATE_FORMAT)
        .map_err(|source| ExtractionError::InvalidTimestamp {
            field: BIRTH_DATE_FIELD,
            format: BIRTH_DATE_FORMAT,
            source,
        })?;

    let client = ClientDetails {
        last_name: string_value(data, LAST_NAME_FIELD)?.to_string(),
        birthdate,
        phone_number: format_phone_number(
            data.value(PHONE_FIELD).and_then(Value::as_str),
        ),
    };

    Ok(BookingRequest {
        products: vec![product],
        location,
        start_at,
        client,
    })
}

/// Strip every character that is not a digit, space, `+` or `-` and keep at
/// most 16 characters. Absent or empty input yields no value.
pub fn format_phone_number(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }

    Some(
        raw.chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-'))
            .take(PHONE_NUMBER_MAX_LEN)
            .collect(),
    )
}

fn string_value<'a>(
    data: &'a AppointmentData,
    field: &'static str,
) -> Result<&'a str, ExtractionError> {
    data.value(field)
        .and_then(Value::as_str)
        .ok_or(ExtractionError::MalformedValue {
            field,
            expected: "a string",
        })
}

fn reference_value(
    data: &AppointmentData,
    field: &'static str,
) -> Result<(String, String), ExtractionError> {
    let member = |key: &str| -> Result<String, ExtractionError> {
        data.value(field)
            .and_then(|value| value.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ExtractionError::MalformedValue {
                field,
                expected: "an object with 'identifier' and 'name'",
            })
    };

    Ok((member("identifier")?, member("name")?))
}
