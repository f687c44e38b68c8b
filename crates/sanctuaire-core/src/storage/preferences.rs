//! User preferences persisted in a key-value store.
//!
//! The host writes preferences; a session reads them once when it is built.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::cue::CueKind;
use crate::error::StorageError;
use crate::session::{clamp_cue_interval_ms, DEFAULT_CUE_INTERVAL_MS};

pub const DURATIONS_KEY: &str = "sanctuaire_durations";
pub const CUE_KIND_KEY: &str = "sanctuaire_cue_kind";
pub const CUE_INTERVAL_KEY: &str = "sanctuaire_cue_interval_ms";

/// Shortest duration a user can give a step.
pub const MIN_STEP_DURATION_SECS: u64 = 10;
/// Granularity of duration adjustments.
pub const DURATION_INCREMENT_SECS: u64 = 10;

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    durations: BTreeMap<String, u64>,
    cue_kind: CueKind,
    cue_interval_ms: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            durations: BTreeMap::new(),
            cue_kind: CueKind::default(),
            cue_interval_ms: DEFAULT_CUE_INTERVAL_MS,
        }
    }
}

impl Preferences {
    /// Read preferences from `store`.
    ///
    /// Unreadable values fall back to their defaults with a warning; only a
    /// failing store is an error.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let mut prefs = Self::default();

        if let Some(raw) = store.get(DURATIONS_KEY)? {
            match serde_json::from_str::<BTreeMap<String, u64>>(&raw) {
                Ok(map) => {
                    prefs.durations = map.into_iter().filter(|(_, secs)| *secs > 0).collect();
                }
                Err(e) => tracing::warn!(key = DURATIONS_KEY, error = %e, "Ignoring corrupt preference"),
            }
        }

        if let Some(raw) = store.get(CUE_KIND_KEY)? {
            match raw.parse::<CueKind>() {
                Ok(kind) => prefs.cue_kind = kind,
                Err(e) => tracing::warn!(key = CUE_KIND_KEY, error = %e, "Ignoring corrupt preference"),
            }
        }

        if let Some(raw) = store.get(CUE_INTERVAL_KEY)? {
            match raw.trim().parse::<u64>() {
                Ok(ms) => prefs.cue_interval_ms = clamp_cue_interval_ms(ms),
                Err(e) => tracing::warn!(key = CUE_INTERVAL_KEY, error = %e, "Ignoring corrupt preference"),
            }
        }

        Ok(prefs)
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        if self.durations.is_empty() {
            store.remove(DURATIONS_KEY)?;
        } else {
            let json = serde_json::to_string(&self.durations).map_err(|e| {
                StorageError::CorruptValue {
                    key: DURATIONS_KEY.into(),
                    message: e.to_string(),
                }
            })?;
            store.set(DURATIONS_KEY, &json)?;
        }
        store.set(CUE_KIND_KEY, self.cue_kind.as_str())?;
        store.set(CUE_INTERVAL_KEY, &self.cue_interval_ms.to_string())?;
        Ok(())
    }

    pub fn duration_override(&self, step_id: &str) -> Option<u64> {
        self.durations.get(step_id).copied()
    }

    pub fn durations(&self) -> &BTreeMap<String, u64> {
        &self.durations
    }

    /// Set a step's duration, raised to the minimum if needed. Returns the
    /// stored value.
    pub fn set_duration(&mut self, step_id: &str, secs: u64) -> u64 {
        let secs = secs.max(MIN_STEP_DURATION_SECS);
        self.durations.insert(step_id.to_string(), secs);
        secs
    }

    /// Move a step's duration by `increments` steps of ten seconds from
    /// `current`. Returns the stored value.
    pub fn adjust_duration(&mut self, step_id: &str, current: u64, increments: i64) -> u64 {
        let delta = increments.saturating_mul(DURATION_INCREMENT_SECS as i64);
        let target = (current as i64).saturating_add(delta).max(0) as u64;
        self.set_duration(step_id, target)
    }

    pub fn reset_duration(&mut self, step_id: &str) -> bool {
        self.durations.remove(step_id).is_some()
    }

    pub fn reset_durations(&mut self) {
        self.durations.clear();
    }

    pub fn cue_kind(&self) -> CueKind {
        self.cue_kind
    }

    pub fn set_cue_kind(&mut self, kind: CueKind) {
        self.cue_kind = kind;
    }

    pub fn cue_interval_ms(&self) -> u64 {
        self.cue_interval_ms
    }

    /// Returns the stored (clamped) value.
    pub fn set_cue_interval_ms(&mut self, ms: u64) -> u64 {
        self.cue_interval_ms = clamp_cue_interval_ms(ms);
        self.cue_interval_ms
    }
}
