use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::error::StoreError;
use crate::store::types::ExpiringRecord;

/// File-backed persistence for one store slot. The layout is a single JSON
/// object mapping key -> record, written in full on every mutation.
pub struct SlotPersister {
    path: PathBuf,
}

impl SlotPersister {
    pub fn new(data_dir: &Path, slot: &str) -> Self {
        fs::create_dir_all(data_dir).ok();
        Self {
            path: data_dir.join(format!("{}.json", slot)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted map. A missing file is an empty store, not an error.
    pub fn load<V: DeserializeOwned>(
        &self,
    ) -> Result<HashMap<String, ExpiringRecord<V>>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = fs::read(&self.path)?;
        let map = serde_json::from_slice(&bytes)?;
        Ok(map)
    }

    /// Writes the full map. Failures are surfaced to the caller, which is
    /// expected to log and carry on; the in-memory state stays authoritative.
    pub fn save<V: Serialize>(
        &self,
        map: &HashMap<String, ExpiringRecord<V>>,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(map)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
