//! Durable session records.
//!
//! The persisted session layer mirrors every session into a
//! [`DurableSessionStore`]. Two backends ship here: an in-process map for
//! tests and embedding, and a JSON file that survives restarts.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{SessionId, UserId};

/// A persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub user_id: UserId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Durable storage keyed by session ID.
pub trait DurableSessionStore: Send + Sync {
    /// Insert or replace the record for `record.session_id`.
    fn save(&self, record: SessionRecord) -> Result<()>;

    /// The record for this session, if any.
    fn find_by(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Delete the record. Returns whether it existed.
    fn remove(&self, record: &SessionRecord) -> Result<bool>;

    /// Every stored record.
    fn all(&self) -> Result<Vec<SessionRecord>>;
}

/// Durable store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableSessionStore for MemoryRecordStore {
    fn save(&self, record: SessionRecord) -> Result<()> {
        self.records
            .write()
            .insert(record.session_id.clone(), record);
        Ok(())
    }

    fn find_by(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.records.read().get(session_id).cloned())
    }

    fn remove(&self, record: &SessionRecord) -> Result<bool> {
        Ok(self
            .records
            .write()
            .remove(record.session_id.as_str())
            .is_some())
    }

    fn all(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }
}

/// Durable store backed by a single JSON document on disk.
///
/// The whole file is rewritten on each mutation, via a temp file and rename.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    records: Mutex<BTreeMap<SessionId, SessionRecord>>,
}

impl JsonFileRecordStore {
    /// Open the store at `path`, loading existing records. A missing file is
    /// an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse session file {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session file {}", path.display()));
            }
        };
        info!(
            "Opened session file {} with {} records",
            path.display(),
            records.len()
        );
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, records: &BTreeMap<SessionId, SessionRecord>) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write session file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace session file {}", self.path.display()))?;
        debug!("Wrote {} session records", records.len());
        Ok(())
    }
}

impl DurableSessionStore for JsonFileRecordStore {
    fn save(&self, record: SessionRecord) -> Result<()> {
        let mut records = self.records.lock();
        let previous = records.insert(record.session_id.clone(), record.clone());
        if let Err(e) = self.write(&records) {
            // Keep memory in step with what is on disk.
            match previous {
                Some(prev) => records.insert(record.session_id, prev),
                None => records.remove(record.session_id.as_str()),
            };
            return Err(e);
        }
        Ok(())
    }

    fn find_by(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.records.lock().get(session_id).cloned())
    }

    fn remove(&self, record: &SessionRecord) -> Result<bool> {
        let mut records = self.records.lock();
        let Some(removed) = records.remove(record.session_id.as_str()) else {
            return Ok(false);
        };
        if let Err(e) = self.write(&records) {
            records.insert(removed.session_id.clone(), removed);
            return Err(e);
        }
        Ok(true)
    }

    fn all(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.records.lock().values().cloned().collect())
    }
}
