//! Lab report processing orchestrator.
//!
//! Single entry point driving extract -> match -> validate -> append.
//! Every named failure is folded into an `ImportOutcome` with
//! `success: false`; nothing escapes this boundary as an error, so
//! upload flows can always show a message. Readings appended before a
//! later failure stay appended and are reported in the partial map.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ImportConfig;
use crate::error::PipelineError;
use crate::extraction;
use crate::matcher::BiomarkerMatcher;
use crate::models::enums::ReadingSource;
use crate::models::reading::RawReadingFields;
use crate::store::{BiomarkerStore, ProfileStore};
use crate::structuring::validate_reading;

/// Confidence assigned to readings recovered by the heuristic text scan.
/// Pattern-matched values are trustworthy enough to store but markedly
/// below a manually entered or API-delivered result.
const LAB_IMPORT_CONFIDENCE: &str = "80";

// ---------------------------------------------------------------------------
// ImportOutcome
// ---------------------------------------------------------------------------

/// Summary returned to the caller after processing one document or batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    pub biomarkers_imported: usize,
    /// Canonical key -> matched value, for everything appended so far.
    pub biomarkers: BTreeMap<String, f64>,
}

impl ImportOutcome {
    fn failure(message: String, biomarkers: BTreeMap<String, f64>) -> Self {
        Self {
            success: false,
            biomarkers_imported: biomarkers.len(),
            message,
            biomarkers,
        }
    }
}

/// One bulk-import row: the canonical key plus the same field schema the
/// validator consumes. Supplied by external collaborators (CSV import)
/// with columns already mapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRow {
    pub biomarker_key: String,
    pub fields: RawReadingFields,
}

// ---------------------------------------------------------------------------
// LabReportProcessor
// ---------------------------------------------------------------------------

pub struct LabReportProcessor<'a, P: ProfileStore> {
    config: &'a ImportConfig,
    matcher: BiomarkerMatcher<'a>,
    store: &'a BiomarkerStore<P>,
}

impl<'a, P: ProfileStore> LabReportProcessor<'a, P> {
    pub fn new(config: &'a ImportConfig, store: &'a BiomarkerStore<P>) -> Self {
        Self {
            config,
            matcher: BiomarkerMatcher::new(config),
            store,
        }
    }

    /// Process raw lab-report bytes for a user. `date_tested` is supplied
    /// by the upload flow (report date is not recovered by the scan).
    pub fn process_bytes(&self, user: &str, bytes: &[u8], date_tested: &str) -> ImportOutcome {
        let text = extraction::extract_text(bytes);
        self.process_text(user, &text, date_tested)
    }

    /// Process a lab-report file from disk. An unreadable or missing
    /// path becomes a failed outcome, never a panic or bubbling error.
    pub fn process_path(&self, user: &str, path: &Path, date_tested: &str) -> ImportOutcome {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Lab report unreadable");
                return ImportOutcome::failure(
                    PipelineError::UnreadableFile(path.display().to_string()).to_string(),
                    BTreeMap::new(),
                );
            }
        };
        self.process_bytes(user, &bytes, date_tested)
    }

    fn process_text(&self, user: &str, text: &str, date_tested: &str) -> ImportOutcome {
        if text.trim().is_empty() {
            return ImportOutcome::failure(
                PipelineError::NoTextExtracted.to_string(),
                BTreeMap::new(),
            );
        }

        let matched = self.matcher.scan(text);
        if matched.is_empty() {
            return ImportOutcome::failure(
                PipelineError::NoBiomarkersFound.to_string(),
                BTreeMap::new(),
            );
        }

        let mut imported = BTreeMap::new();
        for (key, value) in &matched {
            if let Err(e) = self.store_matched(user, key, *value, date_tested) {
                tracing::warn!(user, biomarker_key = %key, error = %e, "Import stopped");
                return ImportOutcome::failure(e.to_string(), imported);
            }
            imported.insert(key.clone(), *value);
        }

        tracing::info!(user, count = imported.len(), "Lab report imported");
        ImportOutcome {
            success: true,
            message: format!("Imported {} biomarker(s)", imported.len()),
            biomarkers_imported: imported.len(),
            biomarkers: imported,
        }
    }

    /// Assemble raw fields for one matched value and append the validated
    /// reading. The matcher does not retain units, so the unit and range
    /// are re-supplied here from the reference-range table.
    fn store_matched(
        &self,
        user: &str,
        key: &str,
        value: f64,
        date_tested: &str,
    ) -> Result<(), PipelineError> {
        let range = self.config.range_for(key);
        let fields = RawReadingFields {
            value: Some(value.to_string()),
            unit: range.map(|r| r.unit.clone()),
            date_tested: Some(date_tested.to_string()),
            reference_range_low: range.and_then(|r| r.low).map(|v| v.to_string()),
            reference_range_high: range.and_then(|r| r.high).map(|v| v.to_string()),
            reference_range_unit: range.map(|r| r.unit.clone()),
            confidence_score: Some(LAB_IMPORT_CONFIDENCE.to_string()),
            ..Default::default()
        };

        let reading = validate_reading(&fields, key, ReadingSource::LabImport)?;
        self.store.append(user, key, reading)?;
        Ok(())
    }

    /// Bulk import of pre-mapped rows (CSV collaborator). Rows are
    /// validated independently: a bad row is skipped and reported, and
    /// the remaining rows still import.
    pub fn import_rows(&self, user: &str, rows: &[BulkRow]) -> ImportOutcome {
        let mut imported = BTreeMap::new();
        let mut skipped = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let source = row
                .fields
                .source
                .as_deref()
                .map(ReadingSource::parse_or_manual)
                .unwrap_or(ReadingSource::Manual);

            let reading = match validate_reading(&row.fields, &row.biomarker_key, source) {
                Ok(reading) => reading,
                Err(e) => {
                    skipped.push(format!("row {}: {e}", index + 1));
                    continue;
                }
            };
            let value = reading.value;
            if let Err(e) = self.store.append(user, &row.biomarker_key, reading) {
                tracing::warn!(user, row = index + 1, error = %e, "Bulk import stopped");
                return ImportOutcome::failure(e.to_string(), imported);
            }
            imported.insert(row.biomarker_key.clone(), value);
        }

        let message = if skipped.is_empty() {
            format!("Imported {} row(s)", rows.len())
        } else {
            format!(
                "Imported {} row(s); skipped {}: {}",
                rows.len() - skipped.len(),
                skipped.len(),
                skipped.join("; ")
            )
        };

        tracing::info!(
            user,
            imported = rows.len() - skipped.len(),
            skipped = skipped.len(),
            "Bulk import complete"
        );
        ImportOutcome {
            success: skipped.is_empty(),
            message,
            biomarkers_imported: rows.len() - skipped.len(),
            biomarkers: imported,
        }
    }
}
