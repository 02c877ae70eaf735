//! Indexed backing store for noise datasets too large to hold as parsed
//! records.
//!
//! This is the external-collaborator boundary of the batched merge path: it
//! accepts a bulk load of the noise file keyed by identifier and answers
//! batched fetch queries. The store file is transient and recreated per run.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use simd_r_drive::storage_engine::DataStore;
use simd_r_drive::storage_engine::traits::{DataStoreReader, DataStoreWriter};
use tracing::debug;

use crate::constants::store::{BULK_WRITE_BATCH, RECORD_KEY_PREFIX};
use crate::dataset::{IdentifierSpace, NoiseGuard, stream_rows};
use crate::errors::MixError;
use crate::record::{Record, Schema};
use crate::types::RecordId;

/// Noise record index keyed by identifier.
pub struct NoiseStore {
    store: DataStore,
    path: PathBuf,
}

impl NoiseStore {
    /// Create a fresh store at `path`, dropping any previous run's index.
    pub fn recreate<P: Into<PathBuf>>(path: P) -> Result<Self, MixError> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        let store = DataStore::open(path.as_path())?;
        Ok(Self { store, path })
    }

    /// Store file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream the noise file at `noise_path` into the index without
    /// materializing the dataset, validating the identifier partition on the
    /// way in. Returns the identifiers in file order.
    pub fn bulk_load(
        &self,
        noise_path: &Path,
        schema: &Schema,
        space: &IdentifierSpace,
    ) -> Result<Vec<RecordId>, MixError> {
        let mut guard = NoiseGuard::new(space, noise_path);
        let mut ids = Vec::new();
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        stream_rows(noise_path, schema, |record| {
            guard.admit(record.id)?;
            ids.push(record.id);
            entries.push((record_key(record.id), bitcode::encode(&record)));
            if entries.len() >= BULK_WRITE_BATCH {
                write_entries(&self.store, &mut entries)?;
            }
            Ok(())
        })?;
        write_entries(&self.store, &mut entries)?;
        debug!(
            path = %noise_path.display(),
            records = ids.len(),
            store = %self.path.display(),
            "indexed noise dataset"
        );
        Ok(ids)
    }

    /// Fetch records for `ids` with exactly one batched query over the
    /// distinct identifiers. Every requested identifier must resolve; a miss
    /// is a data-integrity failure, not a recoverable condition.
    pub fn fetch_batch(&self, ids: &[RecordId]) -> Result<HashMap<RecordId, Record>, MixError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut distinct = Vec::with_capacity(ids.len());
        for &id in ids {
            if seen.insert(id) {
                distinct.push(id);
            }
        }
        let keys: Vec<Vec<u8>> = distinct.iter().map(|id| record_key(*id)).collect();
        let key_refs: Vec<&[u8]> = keys.iter().map(|key| key.as_slice()).collect();
        let entries = self.store.batch_read(&key_refs)?;
        let mut fetched = HashMap::with_capacity(distinct.len());
        for (id, entry) in distinct.into_iter().zip(entries.into_iter()) {
            let entry = entry.ok_or(MixError::MissingRecord { id })?;
            let record: Record = bitcode::decode(entry.as_ref()).map_err(|err| {
                MixError::InvariantViolation(format!(
                    "backing store entry for identifier {id} failed to decode: {err}"
                ))
            })?;
            fetched.insert(id, record);
        }
        Ok(fetched)
    }
}

fn write_entries(store: &DataStore, entries: &mut Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), MixError> {
    if entries.is_empty() {
        return Ok(());
    }
    let entry_refs: Vec<(&[u8], &[u8])> = entries
        .iter()
        .map(|(key, value)| (key.as_slice(), value.as_slice()))
        .collect();
    store.batch_write(&entry_refs)?;
    entries.clear();
    Ok(())
}

fn record_key(id: RecordId) -> Vec<u8> {
    let mut key = Vec::with_capacity(RECORD_KEY_PREFIX.len() + 8);
    key.extend_from_slice(RECORD_KEY_PREFIX);
    key.extend_from_slice(&id.to_le_bytes());
    key
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), MixError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
