use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReadingSource, ReadingStatus};

/// One validated biomarker measurement, owned by a single user.
///
/// Immutable once created: `status` is derived at construction from the
/// value and reference range and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomarkerReading {
    pub id: Uuid,
    pub biomarker_key: String,
    pub value: f64,
    pub unit: String,
    pub reference_range_low: Option<f64>,
    pub reference_range_high: Option<f64>,
    pub reference_range_unit: Option<String>,
    /// Test date as captured from the source document or row. Parsed
    /// permissively at read time; never format-validated on write.
    pub date_tested: String,
    pub lab_name: Option<String>,
    pub lab_id: Option<String>,
    pub test_method: Option<String>,
    pub status: ReadingStatus,
    pub notes: Option<String>,
    pub source: ReadingSource,
    pub confidence_score: i64,
    pub loinc_code: Option<String>,
    pub specimen_type: Option<String>,
    pub created_at: NaiveDateTime,
}

impl BiomarkerReading {
    /// Best-effort parse of `date_tested`. Unparseable dates yield `None`
    /// and sort earliest in latest-reading lookups.
    pub fn parsed_date_tested(&self) -> Option<NaiveDate> {
        parse_date_permissive(&self.date_tested)
    }
}

/// Date formats accepted across lab exports and manual entry.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// Try each known format against the trimmed input; for timestamp-like
/// strings, retry on the first ten characters (date part of RFC 3339).
pub fn parse_date_permissive(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    if let Some(head) = trimmed.get(..10) {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(head, format) {
                return Some(date);
            }
        }
    }
    None
}

/// Raw field map for one reading, as supplied by a bulk-import row or
/// assembled by the pipeline from matched values. All fields optional;
/// the validator decides which are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReadingFields {
    pub value: Option<String>,
    pub unit: Option<String>,
    pub date_tested: Option<String>,
    pub reference_range_low: Option<String>,
    pub reference_range_high: Option<String>,
    pub reference_range_unit: Option<String>,
    pub lab_name: Option<String>,
    pub lab_id: Option<String>,
    pub test_method: Option<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub confidence_score: Option<String>,
    pub loinc_code: Option<String>,
    pub specimen_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_common_formats() {
        assert_eq!(
            parse_date_permissive("2026-03-14"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
        assert_eq!(
            parse_date_permissive("03/14/2026"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
        assert_eq!(
            parse_date_permissive("14 Mar 2026"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
    }

    #[test]
    fn parse_date_timestamp_prefix() {
        assert_eq!(
            parse_date_permissive("2026-03-14T09:30:00Z"),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
    }

    #[test]
    fn parse_date_garbage_is_none() {
        assert_eq!(parse_date_permissive("soon"), None);
        assert_eq!(parse_date_permissive(""), None);
        assert_eq!(parse_date_permissive("  "), None);
    }
}
