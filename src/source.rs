//! Noise record sources.
//!
//! The merge engine is generic over where noise records live: fully parsed in
//! memory, or resolved on demand from the indexed backing store. Both fail
//! fast when an expected identifier has no record; a missing noise record is
//! always a data-integrity bug, never a recoverable condition.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;

use crate::dataset::{IdentifierSpace, load_noise};
use crate::errors::MixError;
use crate::record::{Record, Schema, Sign};
use crate::store::NoiseStore;
use crate::types::RecordId;

/// One resolved emission event: identifier plus polarity.
///
/// Staged fetches are keyed by the full event, not the identifier alone, so
/// an insert and its later delete can never reuse one cache entry even when
/// both land in the same batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventRef {
    /// Identifier being emitted.
    pub id: RecordId,
    /// Polarity resolved for this occurrence.
    pub sign: Sign,
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.sign)
    }
}

/// Where noise records come from during one merge run.
pub trait NoiseSource {
    /// Distinct noise identifiers in deterministic order.
    fn ids(&self) -> Vec<RecordId>;
    /// Make the records behind `batch` available for resolution.
    fn stage(&mut self, batch: &[EventRef]) -> Result<(), MixError>;
    /// Hand over the record for one staged event.
    fn resolve(&mut self, event: EventRef) -> Result<Record, MixError>;
    /// Terminal gate: every staged record must have been written out.
    fn finish(&self) -> Result<(), MixError>;
}

/// Fully materialized noise dataset.
#[derive(Debug, Default)]
pub struct InMemoryNoise {
    records: IndexMap<RecordId, Record>,
}

impl InMemoryNoise {
    /// Wrap already-validated noise records, keeping their order.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id, record))
                .collect(),
        }
    }

    /// Load and validate a noise file into memory.
    pub fn load(path: &Path, schema: &Schema, space: &IdentifierSpace) -> Result<Self, MixError> {
        Ok(Self::from_records(load_noise(path, schema, space)?))
    }

    /// Number of noise records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there is no noise at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl NoiseSource for InMemoryNoise {
    fn ids(&self) -> Vec<RecordId> {
        self.records.keys().copied().collect()
    }

    fn stage(&mut self, _batch: &[EventRef]) -> Result<(), MixError> {
        Ok(())
    }

    fn resolve(&mut self, event: EventRef) -> Result<Record, MixError> {
        self.records
            .get(&event.id)
            .cloned()
            .ok_or(MixError::MissingRecord { id: event.id })
    }

    fn finish(&self) -> Result<(), MixError> {
        Ok(())
    }
}

/// Noise dataset resolved on demand from the indexed backing store.
///
/// Lookups are answered per staged batch: one query over the distinct
/// identifiers, fanned out into one pending entry per event. Entries are
/// removed as they are written, and the pending cache must be empty once the
/// emission order is fully consumed.
pub struct StoreBackedNoise {
    store: NoiseStore,
    ids: Vec<RecordId>,
    pending: HashMap<EventRef, Record>,
}

impl StoreBackedNoise {
    /// Bulk-load the noise file at `noise_path` into `store` and expose it as
    /// a source.
    pub fn load(
        store: NoiseStore,
        noise_path: &Path,
        schema: &Schema,
        space: &IdentifierSpace,
    ) -> Result<Self, MixError> {
        let ids = store.bulk_load(noise_path, schema, space)?;
        Ok(Self {
            store,
            ids,
            pending: HashMap::new(),
        })
    }

    /// Number of records currently staged and not yet written.
    pub fn staged(&self) -> usize {
        self.pending.len()
    }
}

impl NoiseSource for StoreBackedNoise {
    fn ids(&self) -> Vec<RecordId> {
        self.ids.clone()
    }

    fn stage(&mut self, batch: &[EventRef]) -> Result<(), MixError> {
        if batch.is_empty() {
            return Ok(());
        }
        let ids: Vec<RecordId> = batch.iter().map(|event| event.id).collect();
        let fetched = self.store.fetch_batch(&ids)?;
        for event in batch {
            let record = fetched
                .get(&event.id)
                .ok_or(MixError::MissingRecord { id: event.id })?;
            self.pending.insert(*event, record.clone());
        }
        Ok(())
    }

    fn resolve(&mut self, event: EventRef) -> Result<Record, MixError> {
        self.pending.remove(&event).ok_or_else(|| {
            MixError::InvariantViolation(format!("no staged record for event {event}"))
        })
    }

    fn finish(&self) -> Result<(), MixError> {
        if !self.pending.is_empty() {
            return Err(MixError::InvariantViolation(format!(
                "{} staged records were never written",
                self.pending.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AttrValue;
    use std::fs;
    use tempfile::tempdir;

    fn record(id: RecordId, value: i64) -> Record {
        Record {
            id,
            attrs: vec![AttrValue::Int(value)],
        }
    }

    #[test]
    fn in_memory_resolves_by_identifier() {
        let mut source = InMemoryNoise::from_records(vec![record(5, 50), record(6, 60)]);
        assert_eq!(source.ids(), vec![5, 6]);
        let event = EventRef {
            id: 6,
            sign: Sign::Insert,
        };
        assert_eq!(source.resolve(event).unwrap(), record(6, 60));
        let missing = source
            .resolve(EventRef {
                id: 9,
                sign: Sign::Insert,
            })
            .unwrap_err();
        assert!(matches!(missing, MixError::MissingRecord { id: 9 }));
    }

    fn backed_source(dir: &Path, rows: &[&str]) -> StoreBackedNoise {
        let noise_path = dir.join("noise_inserts.csv");
        let mut lines = vec!["id,attr1,sign"];
        lines.extend_from_slice(rows);
        fs::write(&noise_path, lines.join("\n")).unwrap();
        let store = NoiseStore::recreate(dir.join("noise_index.bin")).unwrap();
        StoreBackedNoise::load(
            store,
            &noise_path,
            &Schema::numeric(1),
            &IdentifierSpace::new(0, 5),
        )
        .unwrap()
    }

    #[test]
    fn staged_insert_and_delete_are_independent_entries() {
        let temp = tempdir().unwrap();
        let mut source = backed_source(temp.path(), &["5,50,1"]);
        let insert = EventRef {
            id: 5,
            sign: Sign::Insert,
        };
        let delete = EventRef {
            id: 5,
            sign: Sign::Delete,
        };
        source.stage(&[insert, delete]).unwrap();
        assert_eq!(source.staged(), 2);
        assert_eq!(source.resolve(insert).unwrap(), record(5, 50));
        assert_eq!(source.resolve(delete).unwrap(), record(5, 50));
        source.finish().unwrap();
    }

    #[test]
    fn resolving_an_unstaged_event_is_an_internal_failure() {
        let temp = tempdir().unwrap();
        let mut source = backed_source(temp.path(), &["5,50,1"]);
        let event = EventRef {
            id: 5,
            sign: Sign::Insert,
        };
        source.stage(&[event]).unwrap();
        source.resolve(event).unwrap();
        let err = source.resolve(event).unwrap_err();
        assert!(matches!(err, MixError::InvariantViolation(_)));
    }

    #[test]
    fn unresolved_staged_records_fail_the_terminal_gate() {
        let temp = tempdir().unwrap();
        let mut source = backed_source(temp.path(), &["5,50,1"]);
        source
            .stage(&[EventRef {
                id: 5,
                sign: Sign::Insert,
            }])
            .unwrap();
        let err = source.finish().unwrap_err();
        assert!(matches!(err, MixError::InvariantViolation(_)));
    }
}
