//! Measurement timestamps on the wire: compact ISO 8601 basic format, UTC.

use crate::error::AppError;
use chrono::NaiveDateTime;

/// `YYYYMMDDThhmmssZ`
pub const MEASUREMENT_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub fn parse_measurement_date(s: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(s.trim(), MEASUREMENT_DATE_FORMAT).map_err(|e| {
        AppError::BadRequest(format!("invalid date '{}': expected YYYYMMDDThhmmssZ ({})", s, e))
    })
}

pub fn format_measurement_date(date: &NaiveDateTime) -> String {
    date.format(MEASUREMENT_DATE_FORMAT).to_string()
}
