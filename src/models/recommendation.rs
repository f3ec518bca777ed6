use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::RecommendationStatus;

/// A retest suggestion: one row per (symptom, correlated biomarker) pair.
///
/// Two active symptoms correlated to the same biomarker produce two rows;
/// deduplication is left to presentation layers that want it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Canonical biomarker key.
    pub biomarker: String,
    /// The symptom that triggered this row.
    pub reason: String,
    /// symptom weight x biomarker weight.
    pub priority: i64,
    pub last_tested: Option<NaiveDate>,
    pub status: RecommendationStatus,
}
