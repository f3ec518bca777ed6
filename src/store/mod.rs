//! Per-user, per-biomarker reading history with audit-trail semantics.
//!
//! Each `(user, biomarker_key)` pair owns an append-only log persisted as
//! one profile-store entry. Appends are serialized per key behind a
//! dedicated mutex, so concurrent imports for the same user cannot lose
//! each other's writes; the read contract stays a chronological list.

pub mod profile;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::config::ExpirationRules;
use crate::models::reading::BiomarkerReading;

pub use profile::{MemoryProfileStore, ProfileStore};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid user: {0}")]
    InvalidUser(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal lock failed")]
    LockFailed,
}

// ---------------------------------------------------------------------------
// BiomarkerStore
// ---------------------------------------------------------------------------

/// Profile-store key prefix for one biomarker's history log.
const HISTORY_PREFIX: &str = "biomarker_history:";

/// Profile-store key listing every biomarker a user has readings for.
const KEY_INDEX: &str = "biomarker_keys";

pub struct BiomarkerStore<P: ProfileStore> {
    profile: P,
    rules: ExpirationRules,
    /// One append lock per (user, biomarker_key).
    series_locks: RwLock<HashMap<(String, String), Arc<Mutex<()>>>>,
    /// Serializes updates to the per-user key index.
    index_lock: Mutex<()>,
}

impl<P: ProfileStore> BiomarkerStore<P> {
    pub fn new(profile: P, rules: ExpirationRules) -> Self {
        Self {
            profile,
            rules,
            series_locks: RwLock::new(HashMap::new()),
            index_lock: Mutex::new(()),
        }
    }

    /// Append one reading to a user's history for `biomarker_key`.
    /// Strictly additive: prior entries are never rewritten or removed.
    pub fn append(
        &self,
        user: &str,
        biomarker_key: &str,
        reading: BiomarkerReading,
    ) -> Result<(), StoreError> {
        let lock = self.series_lock(user, biomarker_key)?;
        let _guard = lock.lock().map_err(|_| StoreError::LockFailed)?;

        let mut series = self.get_series(user, biomarker_key)?;
        series.push(reading);
        let json = serde_json::to_value(&series)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.profile
            .set(user, &format!("{HISTORY_PREFIX}{biomarker_key}"), json)?;

        self.index_key(user, biomarker_key)?;

        tracing::debug!(
            user,
            biomarker_key,
            series_len = series.len(),
            "Reading appended"
        );
        Ok(())
    }

    /// Full ordered history for one biomarker. Insertion order.
    pub fn get_series(
        &self,
        user: &str,
        biomarker_key: &str,
    ) -> Result<Vec<BiomarkerReading>, StoreError> {
        match self
            .profile
            .get(user, &format!("{HISTORY_PREFIX}{biomarker_key}"))?
        {
            Some(json) => serde_json::from_value(json)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    /// The reading with the maximum best-effort-parsed `date_tested`.
    /// Unparseable dates sort earliest; ties go to the later insertion.
    pub fn get_latest(
        &self,
        user: &str,
        biomarker_key: &str,
    ) -> Result<Option<BiomarkerReading>, StoreError> {
        let series = self.get_series(user, biomarker_key)?;
        Ok(series
            .into_iter()
            .enumerate()
            .max_by_key(|(i, r)| (r.parsed_date_tested(), *i))
            .map(|(_, r)| r))
    }

    /// Every biomarker series for a user, keyed by canonical key.
    pub fn get_all(
        &self,
        user: &str,
    ) -> Result<BTreeMap<String, Vec<BiomarkerReading>>, StoreError> {
        let mut all = BTreeMap::new();
        for key in self.indexed_keys(user)? {
            let series = self.get_series(user, &key)?;
            all.insert(key, series);
        }
        Ok(all)
    }

    /// True when the reading's age in days exceeds the biomarker's
    /// configured maximum (or the fallback default). A reading whose
    /// test date cannot be parsed counts as stale: its freshness cannot
    /// be established.
    pub fn is_stale(
        &self,
        reading: &BiomarkerReading,
        biomarker_key: &str,
        today: NaiveDate,
    ) -> bool {
        match reading.parsed_date_tested() {
            Some(tested) => {
                let age_days = (today - tested).num_days();
                age_days > self.rules.max_age_days(biomarker_key)
            }
            None => true,
        }
    }

    /// `is_stale` against the current UTC date.
    pub fn is_stale_now(&self, reading: &BiomarkerReading, biomarker_key: &str) -> bool {
        self.is_stale(reading, biomarker_key, Utc::now().date_naive())
    }

    fn series_lock(
        &self,
        user: &str,
        biomarker_key: &str,
    ) -> Result<Arc<Mutex<()>>, StoreError> {
        let key = (user.to_string(), biomarker_key.to_string());
        {
            let locks = self.series_locks.read().map_err(|_| StoreError::LockFailed)?;
            if let Some(lock) = locks.get(&key) {
                return Ok(lock.clone());
            }
        }
        let mut locks = self.series_locks.write().map_err(|_| StoreError::LockFailed)?;
        Ok(locks.entry(key).or_default().clone())
    }

    /// Record `biomarker_key` in the user's key index if not yet present.
    fn index_key(&self, user: &str, biomarker_key: &str) -> Result<(), StoreError> {
        let _guard = self.index_lock.lock().map_err(|_| StoreError::LockFailed)?;
        let mut keys = self.indexed_keys(user)?;
        if !keys.iter().any(|k| k == biomarker_key) {
            keys.push(biomarker_key.to_string());
            let json = serde_json::to_value(&keys)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            self.profile.set(user, KEY_INDEX, json)?;
        }
        Ok(())
    }

    fn indexed_keys(&self, user: &str) -> Result<Vec<String>, StoreError> {
        match self.profile.get(user, KEY_INDEX)? {
            Some(json) => serde_json::from_value(json)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(Vec::new()),
        }
    }
}
