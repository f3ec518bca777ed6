//! Immutable import configuration: alias table, unit whitelist, reference
//! ranges, expiration rules, and correlation/weight tables.
//!
//! Loaded once (from a bundled JSON file or `builtin()`) and passed by
//! reference into each component. Never mutated at runtime.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load failed ({0}): {1}")]
    Load(String, String),

    #[error("Config parse failed ({0}): {1}")]
    Parse(String, String),
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// Canonical biomarker key plus the case-insensitive substrings that
/// identify it in report text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomarkerAlias {
    pub key: String,
    pub patterns: Vec<String>,
}

/// Reference range for one biomarker, in the unit lab panels report it in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub key: String,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub unit: String,
}

/// Per-biomarker maximum reading age, with a fallback for unmapped keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationRules {
    pub days: HashMap<String, i64>,
    pub default_days: i64,
}

impl ExpirationRules {
    pub fn max_age_days(&self, biomarker_key: &str) -> i64 {
        self.days
            .get(biomarker_key)
            .copied()
            .unwrap_or(self.default_days)
    }
}

/// Weight tables for recommendation priority. Unlisted entries weigh 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationWeights {
    pub symptoms: HashMap<String, i64>,
    pub biomarkers: HashMap<String, i64>,
}

impl CorrelationWeights {
    pub fn symptom(&self, name: &str) -> i64 {
        self.symptoms.get(name).copied().unwrap_or(1)
    }

    pub fn biomarker(&self, key: &str) -> i64 {
        self.biomarkers.get(key).copied().unwrap_or(1)
    }
}

/// Symptom name mapped to the display names of its correlated biomarkers.
/// Display names are resolved to canonical keys through the alias table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomCorrelation {
    pub symptom: String,
    pub biomarkers: Vec<String>,
}

// ---------------------------------------------------------------------------
// ImportConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub aliases: Vec<BiomarkerAlias>,
    pub units: Vec<String>,
    pub reference_ranges: Vec<ReferenceRange>,
    pub expiration: ExpirationRules,
    pub weights: CorrelationWeights,
    pub correlations: Vec<SymptomCorrelation>,
}

impl ImportConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    /// Reference range entry for a canonical key.
    pub fn range_for(&self, biomarker_key: &str) -> Option<&ReferenceRange> {
        self.reference_ranges
            .iter()
            .find(|r| r.key == biomarker_key)
    }

    /// Unit a biomarker is reported in, from the reference-range table.
    pub fn unit_for(&self, biomarker_key: &str) -> Option<&str> {
        self.range_for(biomarker_key).map(|r| r.unit.as_str())
    }

    /// Resolve a display name ("Vitamin D") to a canonical key ("vitamin_d").
    ///
    /// Matches against alias keys and patterns case-insensitively; names
    /// with no alias entry fall back to a lowercase underscore slug so a
    /// correlation row can never silently vanish.
    pub fn resolve_key(&self, display_name: &str) -> String {
        let lower = display_name.trim().to_lowercase();
        let slug = lower.replace([' ', '-'], "_");
        for alias in &self.aliases {
            if alias.key == slug || alias.patterns.iter().any(|p| p.to_lowercase() == lower) {
                return alias.key.clone();
            }
        }
        slug
    }

    /// Built-in configuration covering a common wellness panel.
    /// Used by tests and as the default when no config file is bundled.
    pub fn builtin() -> Self {
        let aliases = vec![
            alias("glucose", &["glucose"]),
            alias("hba1c", &["hba1c", "hemoglobin a1c"]),
            alias("vitamin_d", &["vitamin d", "25-oh vitamin d", "25-hydroxyvitamin d"]),
            alias("vitamin_b12", &["vitamin b12", "cobalamin"]),
            alias("testosterone", &["testosterone"]),
            alias("tsh", &["tsh", "thyroid stimulating hormone"]),
            alias("ferritin", &["ferritin"]),
            alias("hemoglobin", &["hemoglobin", "haemoglobin", "hgb"]),
            alias("hdl", &["hdl"]),
            alias("ldl", &["ldl"]),
            alias("crp", &["crp", "c-reactive protein"]),
            alias("cortisol", &["cortisol"]),
        ];

        let units = [
            "mg/dL", "mmol/L", "ng/mL", "ng/dL", "pg/mL", "nmol/L", "g/dL", "ug/dL",
            "mcg/dL", "mIU/L", "uIU/mL", "IU/mL", "U/L", "pmol/L", "%",
        ]
        .iter()
        .map(|u| u.to_string())
        .collect();

        let reference_ranges = vec![
            range("glucose", Some(70.0), Some(99.0), "mg/dL"),
            range("hba1c", Some(4.0), Some(5.6), "%"),
            range("vitamin_d", Some(30.0), Some(100.0), "ng/mL"),
            range("vitamin_b12", Some(200.0), Some(900.0), "pg/mL"),
            range("testosterone", Some(300.0), Some(1000.0), "ng/dL"),
            range("tsh", Some(0.4), Some(4.0), "mIU/L"),
            range("ferritin", Some(20.0), Some(250.0), "ng/mL"),
            range("hemoglobin", Some(12.0), Some(17.5), "g/dL"),
            range("hdl", Some(40.0), None, "mg/dL"),
            range("ldl", None, Some(100.0), "mg/dL"),
            range("crp", None, Some(3.0), "mg/dL"),
            range("cortisol", Some(6.0), Some(23.0), "ug/dL"),
        ];

        let expiration = ExpirationRules {
            days: [
                ("glucose", 180),
                ("hba1c", 180),
                ("vitamin_d", 365),
                ("vitamin_b12", 365),
                ("testosterone", 90),
                ("tsh", 365),
                ("ferritin", 365),
                ("hemoglobin", 180),
                ("cortisol", 90),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
            default_days: 365,
        };

        let weights = CorrelationWeights {
            symptoms: [
                ("Fatigue", 3),
                ("Hair Loss", 2),
                ("Low Libido", 2),
                ("Weight Gain", 2),
                ("Brain Fog", 2),
                ("Poor Sleep", 1),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
            biomarkers: [
                ("vitamin_d", 3),
                ("ferritin", 2),
                ("tsh", 2),
                ("testosterone", 2),
                ("vitamin_b12", 2),
                ("hemoglobin", 1),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        };

        let correlations = vec![
            correlation("Fatigue", &["Vitamin D", "Ferritin", "TSH", "Hemoglobin", "Vitamin B12"]),
            correlation("Hair Loss", &["Ferritin", "TSH"]),
            correlation("Low Libido", &["Testosterone"]),
            correlation("Weight Gain", &["TSH", "Glucose", "Cortisol"]),
            correlation("Brain Fog", &["Vitamin D", "Vitamin B12", "TSH"]),
            correlation("Poor Sleep", &["Cortisol"]),
        ];

        Self {
            aliases,
            units,
            reference_ranges,
            expiration,
            weights,
            correlations,
        }
    }
}

fn alias(key: &str, patterns: &[&str]) -> BiomarkerAlias {
    BiomarkerAlias {
        key: key.into(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
    }
}

fn range(key: &str, low: Option<f64>, high: Option<f64>, unit: &str) -> ReferenceRange {
    ReferenceRange {
        key: key.into(),
        low,
        high,
        unit: unit.into(),
    }
}

fn correlation(symptom: &str, biomarkers: &[&str]) -> SymptomCorrelation {
    SymptomCorrelation {
        symptom: symptom.into(),
        biomarkers: biomarkers.iter().map(|b| b.to_string()).collect(),
    }
}
