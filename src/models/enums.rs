use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ReadingStatus
// ---------------------------------------------------------------------------

/// Where a reading's value sits relative to its reference range.
///
/// `Critical` is a declared flag carried for externally sourced readings;
/// no derivation rule in this crate currently produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Low,
    Normal,
    High,
    Critical,
    Unknown,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// ReadingSource
// ---------------------------------------------------------------------------

/// How a reading entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    Manual,
    LabImport,
    Api,
}

impl ReadingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::LabImport => "lab_import",
            Self::Api => "api",
        }
    }

    /// Lenient parse for bulk-import rows. Unrecognized values fall back
    /// to `Manual` rather than failing the row.
    pub fn parse_or_manual(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "lab_import" => Self::LabImport,
            "api" => Self::Api,
            _ => Self::Manual,
        }
    }
}

// ---------------------------------------------------------------------------
// RecommendationStatus
// ---------------------------------------------------------------------------

/// Why a retest recommendation was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    /// No reading on file for the biomarker.
    NotTested,
    /// Latest reading is older than the biomarker's expiration window.
    Stale,
}

impl RecommendationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotTested => "not_tested",
            Self::Stale => "stale",
        }
    }
}
