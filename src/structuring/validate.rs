//! Raw field map -> validated `BiomarkerReading`.
//!
//! Normalization is lossy but deterministic: a non-numeric value coerces
//! to 0.0 instead of failing, because downstream status logic depends on
//! an always-present numeric value. Only genuinely absent required fields
//! reject a row.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::{ReadingSource, ReadingStatus};
use crate::models::reading::{BiomarkerReading, RawReadingFields};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidateError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
}

/// Build a validated reading from raw fields and an externally supplied
/// canonical key. `value`, `unit`, and `date_tested` are required; all
/// other fields are optional and sanitized.
pub fn validate_reading(
    fields: &RawReadingFields,
    biomarker_key: &str,
    source: ReadingSource,
) -> Result<BiomarkerReading, ValidateError> {
    let raw_value = require(&fields.value, "value")?;
    let unit = require(&fields.unit, "unit")?;
    let date_tested = require(&fields.date_tested, "date_tested")?;

    let value = coerce_value(raw_value);
    let reference_range_low = coerce_bound(&fields.reference_range_low);
    let reference_range_high = coerce_bound(&fields.reference_range_high);
    let status = derive_status(value, reference_range_low, reference_range_high);

    Ok(BiomarkerReading {
        id: Uuid::new_v4(),
        biomarker_key: biomarker_key.to_string(),
        value,
        unit: sanitize_text(unit),
        reference_range_low,
        reference_range_high,
        reference_range_unit: optional_text(&fields.reference_range_unit),
        date_tested: sanitize_text(date_tested),
        lab_name: optional_text(&fields.lab_name),
        lab_id: optional_text(&fields.lab_id),
        test_method: optional_text(&fields.test_method),
        status,
        notes: optional_text(&fields.notes),
        source,
        confidence_score: coerce_confidence(&fields.confidence_score),
        loinc_code: optional_text(&fields.loinc_code),
        specimen_type: optional_text(&fields.specimen_type),
        created_at: Utc::now().naive_utc(),
    })
}

fn require<'a>(
    field: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, ValidateError> {
    match field {
        Some(raw) if !raw.trim().is_empty() => Ok(raw.trim()),
        _ => Err(ValidateError::MissingRequiredField(name)),
    }
}

/// Numeric coercion for the measured value. Parse failures become 0.0,
/// never an error; status derivation needs a number either way.
pub fn coerce_value(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// Range bounds are optional: an absent or unparseable bound is `None`,
/// which downgrades the status to `Unknown` rather than comparing
/// against a fabricated 0.0.
fn coerce_bound(field: &Option<String>) -> Option<f64> {
    field.as_deref().and_then(|raw| raw.trim().parse::<f64>().ok())
}

fn coerce_confidence(field: &Option<String>) -> i64 {
    field
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

/// Status from value vs. reference range. Computed once, at creation.
/// Missing either bound means the comparison is meaningless: `Unknown`.
/// No rule maps a value to `Critical`.
fn derive_status(value: f64, low: Option<f64>, high: Option<f64>) -> ReadingStatus {
    let (Some(low), Some(high)) = (low, high) else {
        return ReadingStatus::Unknown;
    };
    if value < low {
        ReadingStatus::Low
    } else if value > high {
        ReadingStatus::High
    } else {
        ReadingStatus::Normal
    }
}

/// Conservative whitelist for free-text fields: alphanumerics, space,
/// and common clinical punctuation.
fn sanitize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if c.is_alphanumeric()
            || matches!(c, '.' | ',' | ':' | ';' | '%' | '/' | '(' | ')' | '+' | '-' | '_' | '^')
        {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

fn optional_text(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(sanitize_text)
        .filter(|s| !s.is_empty())
}
