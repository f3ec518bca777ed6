use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use super::StoreError;

/// Opaque per-user key/value persistence substrate. Implemented elsewhere
/// (CRM-backed profile service in production); this crate only consumes
/// the contract.
pub trait ProfileStore: Send + Sync {
    fn get(&self, user: &str, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, user: &str, key: &str, value: Value) -> Result<bool, StoreError>;
}

/// In-memory `ProfileStore`, the in-tree implementation used by tests and
/// single-process deployments.
pub struct MemoryProfileStore {
    entries: RwLock<HashMap<String, HashMap<String, Value>>>,
    /// When set, only these users are accepted; unknown users error.
    known_users: Option<Vec<String>>,
}

impl MemoryProfileStore {
    /// Open store: any user identifier is accepted.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            known_users: None,
        }
    }

    /// Restricted store: operations against an unregistered user fail
    /// with `StoreError::InvalidUser`, matching the production profile
    /// service's behavior.
    pub fn with_users(users: &[&str]) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            known_users: Some(users.iter().map(|u| u.to_string()).collect()),
        }
    }

    fn check_user(&self, user: &str) -> Result<(), StoreError> {
        if let Some(known) = &self.known_users {
            if !known.iter().any(|u| u == user) {
                return Err(StoreError::InvalidUser(user.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, user: &str, key: &str) -> Result<Option<Value>, StoreError> {
        self.check_user(user)?;
        let entries = self.entries.read().map_err(|_| StoreError::LockFailed)?;
        Ok(entries.get(user).and_then(|kv| kv.get(key)).cloned())
    }

    fn set(&self, user: &str, key: &str, value: Value) -> Result<bool, StoreError> {
        self.check_user(user)?;
        let mut entries = self.entries.write().map_err(|_| StoreError::LockFailed)?;
        entries
            .entry(user.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(true)
    }
}
