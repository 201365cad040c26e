//! Storage for learned action values.
//!
//! The Q-table is a two-level map: state key, then action notation, then value.
//! Pairs that were never updated are not stored and read as 0.0; reads never
//! insert. Entries are only added or overwritten, never removed.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::game::abstraction::StateKey;
use crate::qlearn::error::{QLearnError, Result};

/// Snapshot schema version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Value of a state-action pair that has never been updated.
pub const DEFAULT_VALUE: f64 = 0.0;

/// Action values per state.
///
/// Owned by exactly one agent and mutated only through it. Read-only sharing
/// (for example across evaluation workers) needs no locking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    /// state -> action notation -> value
    values: FxHashMap<StateKey, FxHashMap<String, f64>>,
}

impl QTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with room for `capacity` states.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Value of `action` in `state`, 0.0 if never updated.
    pub fn get(&self, state: &StateKey, action: &str) -> f64 {
        self.values
            .get(state)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(DEFAULT_VALUE)
    }

    /// Stored value of `action` in `state`, if any.
    pub fn stored(&self, state: &StateKey, action: &str) -> Option<f64> {
        self.values.get(state)?.get(action).copied()
    }

    /// All stored action values of a state.
    pub fn actions(&self, state: &StateKey) -> Option<&FxHashMap<String, f64>> {
        self.values.get(state)
    }

    /// Highest stored value in `state`, 0.0 if the state has no entries.
    pub fn max_value(&self, state: &StateKey) -> f64 {
        match self.values.get(state) {
            Some(actions) if !actions.is_empty() => {
                actions.values().copied().fold(f64::NEG_INFINITY, f64::max)
            }
            _ => DEFAULT_VALUE,
        }
    }

    /// Insert or overwrite a value.
    pub fn set(&mut self, state: StateKey, action: &str, value: f64) {
        let actions = self.values.entry(state).or_default();
        match actions.get_mut(action) {
            Some(slot) => *slot = value,
            None => {
                actions.insert(action.to_string(), value);
            }
        }
    }

    /// Number of states with at least one entry.
    pub fn num_states(&self) -> usize {
        self.values.len()
    }

    /// Total number of state-action entries.
    pub fn num_entries(&self) -> usize {
        self.values.values().map(|actions| actions.len()).sum()
    }

    /// Check if a state has entries.
    pub fn contains(&self, state: &StateKey) -> bool {
        self.values.contains_key(state)
    }

    /// Whether nothing has been learned yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over states in arbitrary order.
    pub fn states(&self) -> impl Iterator<Item = &StateKey> {
        self.values.keys()
    }

    /// Export to the serializable snapshot format.
    ///
    /// Entries are sorted by state and action, so equal tables give equal snapshots.
    pub fn snapshot(&self) -> QTableSnapshot {
        let mut entries: Vec<SnapshotEntry> = self
            .values
            .iter()
            .map(|(state, actions)| SnapshotEntry {
                state: *state,
                actions: actions.iter().map(|(a, v)| (a.clone(), *v)).collect(),
            })
            .collect();
        entries.sort_by_key(|entry| entry.state);

        QTableSnapshot {
            version: SNAPSHOT_VERSION,
            entries,
        }
    }

    /// Rebuild a table from a snapshot.
    pub fn from_snapshot(snapshot: QTableSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(QLearnError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut table = Self::with_capacity(snapshot.entries.len());
        for entry in snapshot.entries {
            table
                .values
                .insert(entry.state, entry.actions.into_iter().collect());
        }
        Ok(table)
    }

    /// Save to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let io_error = |source| QLearnError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.snapshot()).map_err(|e| io_error(e.into()))?;
        writer.flush().map_err(io_error)
    }

    /// Load from a JSON file written by [`QTable::save_json`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|source| QLearnError::MissingModel {
            path: path.to_path_buf(),
            source,
        })?;
        let corrupt = |source| QLearnError::CorruptSnapshot {
            path: path.to_path_buf(),
            source,
        };

        // Read the version alone first so a schema change is reported as such
        let header: VersionHeader = serde_json::from_slice(&content).map_err(corrupt)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(QLearnError::UnsupportedVersion {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let snapshot: QTableSnapshot = serde_json::from_slice(&content).map_err(corrupt)?;
        Self::from_snapshot(snapshot)
    }
}

/// Serializable export format for the Q-table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableSnapshot {
    /// Schema version, see [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// One entry per state, sorted by state.
    pub entries: Vec<SnapshotEntry>,
}

/// All stored action values of one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// State key.
    pub state: StateKey,
    /// Action notation -> value.
    pub actions: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("qtable-{}-{}.json", std::process::id(), name))
    }

    fn sample_table() -> QTable {
        let mut table = QTable::new();
        table.set(StateKey::new(15, 15, 20), "e2e4", 0.25);
        table.set(StateKey::new(15, 15, 20), "d2d4", -1.5);
        table.set(StateKey::new(14, 15, 31), "g1f3", 1.0 / 3.0);
        table
    }

    #[test]
    fn test_absent_entries_read_zero_without_inserting() {
        let table = QTable::new();
        let state = StateKey::new(1, 2, 3);

        assert_eq!(table.get(&state, "e2e4"), 0.0);
        assert_eq!(table.max_value(&state), 0.0);
        assert_eq!(table.stored(&state, "e2e4"), None);
        assert!(!table.contains(&state));
        assert!(table.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = QTable::new();
        let state = StateKey::new(1, 2, 3);
        table.set(state, "e2e4", 1.0);
        table.set(state, "e2e4", 2.0);

        assert_eq!(table.get(&state, "e2e4"), 2.0);
        assert_eq!(table.num_states(), 1);
        assert_eq!(table.num_entries(), 1);
    }

    #[test]
    fn test_max_value_with_negative_entries() {
        let mut table = QTable::new();
        let state = StateKey::new(1, 2, 3);
        table.set(state, "a2a3", -2.0);
        table.set(state, "b2b3", -0.5);
        assert_eq!(table.max_value(&state), -0.5);
    }

    #[test]
    fn test_snapshot_is_sorted_and_restores() {
        let table = sample_table();
        let snapshot = table.snapshot();

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.entries.windows(2).all(|w| w[0].state < w[1].state));

        let restored = QTable::from_snapshot(snapshot).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn test_file_round_trip_is_exact() {
        let path = temp_path("round-trip");
        let table = sample_table();

        table.save_json(&path).unwrap();
        let loaded = QTable::load_json(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, table);
        let state = StateKey::new(14, 15, 31);
        assert_eq!(loaded.get(&state, "g1f3").to_bits(), (1.0f64 / 3.0).to_bits());
    }

    #[test]
    fn test_missing_file() {
        let err = QTable::load_json(temp_path("does-not-exist")).unwrap_err();
        assert!(matches!(err, QLearnError::MissingModel { .. }));
    }

    #[test]
    fn test_corrupt_file() {
        let path = temp_path("corrupt");
        fs::write(&path, "{\"states\": []}").unwrap();
        let err = QTable::load_json(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, QLearnError::CorruptSnapshot { .. }));
    }

    #[test]
    fn test_non_utf8_file_is_corrupt_not_missing() {
        let path = temp_path("binary");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x9f, 0x92, 0x96]).unwrap();
        let err = QTable::load_json(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, QLearnError::CorruptSnapshot { .. }));
    }

    #[test]
    fn test_version_mismatch() {
        let path = temp_path("future-version");
        fs::write(&path, "{\"version\": 99, \"rows\": 12}").unwrap();
        let err = QTable::load_json(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(
            err,
            QLearnError::UnsupportedVersion { found: 99, expected: SNAPSHOT_VERSION }
        ));
    }
}
