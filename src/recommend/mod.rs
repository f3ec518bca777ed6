//! Symptom-correlated retest recommendations.
//!
//! For each active symptom, every correlated biomarker that has no
//! reading on file, or whose latest reading has aged past its expiration
//! window, yields one recommendation row. Rows are not deduplicated
//! across symptoms; each (symptom, biomarker) pair stands on its own.

use chrono::{NaiveDate, Utc};

use crate::config::{CorrelationWeights, ImportConfig};
use crate::models::enums::RecommendationStatus;
use crate::models::recommendation::Recommendation;
use crate::store::{BiomarkerStore, ProfileStore, StoreError};

// ---------------------------------------------------------------------------
// SymptomProvider
// ---------------------------------------------------------------------------

/// External collaborator supplying a user's currently active symptoms.
pub trait SymptomProvider {
    fn active_symptoms(&self, user: &str) -> Result<Vec<String>, StoreError>;
}

/// Fixed-list provider for tests and batch jobs.
pub struct FixedSymptoms(pub Vec<String>);

impl SymptomProvider for FixedSymptoms {
    fn active_symptoms(&self, _user: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// RecommendationEngine
// ---------------------------------------------------------------------------

/// A correlation row with its display name resolved to a canonical key.
/// Resolution happens once, at engine construction; readings carry the
/// canonical key end-to-end so it is never re-derived from a reading.
#[derive(Debug, Clone)]
struct ResolvedCorrelation {
    symptom: String,
    biomarker_keys: Vec<String>,
}

pub struct RecommendationEngine<'a, P: ProfileStore> {
    store: &'a BiomarkerStore<P>,
    correlations: Vec<ResolvedCorrelation>,
    weights: CorrelationWeights,
}

impl<'a, P: ProfileStore> RecommendationEngine<'a, P> {
    pub fn new(store: &'a BiomarkerStore<P>, config: &ImportConfig) -> Self {
        let correlations = config
            .correlations
            .iter()
            .map(|row| ResolvedCorrelation {
                symptom: row.symptom.clone(),
                biomarker_keys: row
                    .biomarkers
                    .iter()
                    .map(|name| config.resolve_key(name))
                    .collect(),
            })
            .collect();

        Self {
            store,
            correlations,
            weights: config.weights.clone(),
        }
    }

    /// Generate the ranked recommendation list for a set of active
    /// symptoms. Deterministic: unchanged symptom and biomarker state
    /// produces an identical ordered list.
    pub fn recommend(
        &self,
        user: &str,
        active_symptoms: &[String],
        today: NaiveDate,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let mut recommendations = Vec::new();

        for symptom in active_symptoms {
            let Some(row) = self.correlations.iter().find(|c| &c.symptom == symptom) else {
                continue;
            };
            for key in &row.biomarker_keys {
                let latest = self.store.get_latest(user, key)?;
                let (status, last_tested) = match &latest {
                    None => (RecommendationStatus::NotTested, None),
                    Some(reading) => {
                        if !self.store.is_stale(reading, key, today) {
                            continue;
                        }
                        (RecommendationStatus::Stale, reading.parsed_date_tested())
                    }
                };

                recommendations.push(Recommendation {
                    biomarker: key.clone(),
                    reason: symptom.clone(),
                    priority: self.weights.symptom(symptom) * self.weights.biomarker(key),
                    last_tested,
                    status,
                });
            }
        }

        // Stable sort: ties keep generation order.
        recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));

        tracing::info!(
            user,
            symptoms = active_symptoms.len(),
            recommendations = recommendations.len(),
            "Recommendation pass complete"
        );
        Ok(recommendations)
    }

    /// `recommend` with symptoms pulled from a provider and today's date.
    pub fn recommend_for(
        &self,
        user: &str,
        provider: &dyn SymptomProvider,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let symptoms = provider.active_symptoms(user)?;
        self.recommend(user, &symptoms, Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::enums::{ReadingSource, ReadingStatus};
    use crate::models::reading::BiomarkerReading;
    use crate::store::MemoryProfileStore;

    fn make_reading(key: &str, date: &str) -> BiomarkerReading {
        BiomarkerReading {
            id: Uuid::new_v4(),
            biomarker_key: key.into(),
            value: 50.0,
            unit: "ng/mL".into(),
            reference_range_low: Some(30.0),
            reference_range_high: Some(100.0),
            reference_range_unit: Some("ng/mL".into()),
            date_tested: date.into(),
            lab_name: None,
            lab_id: None,
            test_method: None,
            status: ReadingStatus::Normal,
            notes: None,
            source: ReadingSource::LabImport,
            confidence_score: 80,
            loinc_code: None,
            specimen_type: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn make_store() -> BiomarkerStore<MemoryProfileStore> {
        BiomarkerStore::new(
            MemoryProfileStore::new(),
            ImportConfig::builtin().expiration,
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn missing_reading_emits_not_tested() {
        let store = make_store();
        let config = ImportConfig::builtin();
        let engine = RecommendationEngine::new(&store, &config);

        let recs = engine
            .recommend("u1", &["Fatigue".to_string()], today())
            .unwrap();

        let vit_d = recs.iter().find(|r| r.biomarker == "vitamin_d").unwrap();
        assert_eq!(vit_d.status, RecommendationStatus::NotTested);
        assert_eq!(vit_d.reason, "Fatigue");
        assert_eq!(vit_d.last_tested, None);
    }

    #[test]
    fn stale_reading_emits_recommendation() {
        let store = make_store();
        let config = ImportConfig::builtin();
        // Latest testosterone reading 95 days old; max age is 90.
        store
            .append("u1", "testosterone", make_reading("testosterone", "2026-02-26"))
            .unwrap();
        let engine = RecommendationEngine::new(&store, &config);

        let recs = engine
            .recommend("u1", &["Low Libido".to_string()], today())
            .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].biomarker, "testosterone");
        assert_eq!(recs[0].status, RecommendationStatus::Stale);
        assert_eq!(
            recs[0].last_tested,
            NaiveDate::from_ymd_opt(2026, 2, 26)
        );
    }

    #[test]
    fn fresh_reading_emits_nothing() {
        let store = make_store();
        let config = ImportConfig::builtin();
        store
            .append("u1", "testosterone", make_reading("testosterone", "2026-05-20"))
            .unwrap();
        let engine = RecommendationEngine::new(&store, &config);

        let recs = engine
            .recommend("u1", &["Low Libido".to_string()], today())
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn priority_is_symptom_times_biomarker_weight() {
        let store = make_store();
        let config = ImportConfig::builtin();
        let engine = RecommendationEngine::new(&store, &config);

        let recs = engine
            .recommend("u1", &["Fatigue".to_string()], today())
            .unwrap();

        let vit_d = recs.iter().find(|r| r.biomarker == "vitamin_d").unwrap();
        // Fatigue weight 3, vitamin_d weight 3.
        assert_eq!(vit_d.priority, 9);
    }

    #[test]
    fn doubling_symptom_weight_doubles_priorities() {
        let store = make_store();
        let mut config = ImportConfig::builtin();
        let engine = RecommendationEngine::new(&store, &config);
        let before = engine
            .recommend("u1", &["Fatigue".to_string()], today())
            .unwrap();

        let doubled = config.weights.symptom("Fatigue") * 2;
        config.weights.symptoms.insert("Fatigue".into(), doubled);
        let engine = RecommendationEngine::new(&store, &config);
        let after = engine
            .recommend("u1", &["Fatigue".to_string()], today())
            .unwrap();

        assert_eq!(before.len(), after.len());
        for rec in &before {
            let doubled_rec = after
                .iter()
                .find(|r| r.biomarker == rec.biomarker && r.reason == rec.reason)
                .unwrap();
            assert_eq!(doubled_rec.priority, rec.priority * 2);
        }
    }

    #[test]
    fn shared_biomarker_yields_one_row_per_symptom() {
        let store = make_store();
        let config = ImportConfig::builtin();
        let engine = RecommendationEngine::new(&store, &config);

        // Fatigue and Hair Loss both correlate to ferritin and tsh.
        let recs = engine
            .recommend(
                "u1",
                &["Fatigue".to_string(), "Hair Loss".to_string()],
                today(),
            )
            .unwrap();

        let ferritin_rows: Vec<_> =
            recs.iter().filter(|r| r.biomarker == "ferritin").collect();
        assert_eq!(ferritin_rows.len(), 2);
        assert!(ferritin_rows.iter().any(|r| r.reason == "Fatigue"));
        assert!(ferritin_rows.iter().any(|r| r.reason == "Hair Loss"));
    }

    #[test]
    fn sorted_descending_with_stable_ties() {
        let store = make_store();
        let config = ImportConfig::builtin();
        let engine = RecommendationEngine::new(&store, &config);

        let symptoms = vec!["Fatigue".to_string(), "Brain Fog".to_string()];
        let recs = engine.recommend("u1", &symptoms, today()).unwrap();

        for pair in recs.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }

        // Equal-priority rows keep generation order: within Fatigue's
        // correlations, ferritin, tsh and vitamin_b12 all score 6.
        let tied: Vec<_> = recs
            .iter()
            .filter(|r| r.reason == "Fatigue" && r.priority == 6)
            .collect();
        let keys: Vec<&str> = tied.iter().map(|r| r.biomarker.as_str()).collect();
        assert_eq!(keys, ["ferritin", "tsh", "vitamin_b12"]);
    }

    #[test]
    fn repeat_call_is_idempotent() {
        let store = make_store();
        let config = ImportConfig::builtin();
        store
            .append("u1", "ferritin", make_reading("ferritin", "2024-01-01"))
            .unwrap();
        let engine = RecommendationEngine::new(&store, &config);

        let symptoms = vec!["Fatigue".to_string(), "Hair Loss".to_string()];
        let first = engine.recommend("u1", &symptoms, today()).unwrap();
        let second = engine.recommend("u1", &symptoms, today()).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.biomarker, b.biomarker);
            assert_eq!(a.reason, b.reason);
            assert_eq!(a.priority, b.priority);
            assert_eq!(a.status, b.status);
        }
    }

    #[test]
    fn uncorrelated_symptom_ignored() {
        let store = make_store();
        let config = ImportConfig::builtin();
        let engine = RecommendationEngine::new(&store, &config);

        let recs = engine
            .recommend("u1", &["Hiccups".to_string()], today())
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn provider_feeds_recommend_for() {
        let store = make_store();
        let config = ImportConfig::builtin();
        let engine = RecommendationEngine::new(&store, &config);
        let provider = FixedSymptoms(vec!["Low Libido".to_string()]);

        let recs = engine.recommend_for("u1", &provider).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].biomarker, "testosterone");
        assert_eq!(recs[0].status, RecommendationStatus::NotTested);
    }
}
