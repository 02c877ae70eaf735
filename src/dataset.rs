//! Whole-file dataset loading and identifier-space validation.
//!
//! Base and noise files are read eagerly, one header line skipped, every data
//! line parsed through the row codec. A malformed line aborts the load. The
//! base/noise identifier partition is validated here, at load time, so the
//! downstream state machine can rely on it instead of assuming it.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::errors::MixError;
use crate::record::{Record, Schema, parse_row};
use crate::types::RecordId;

/// Partition of the identifier space between base and noise records.
///
/// Base identifiers are the contiguous run starting at the dataset's first
/// identifier (0 or 1); everything above the run belongs to noise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifierSpace {
    offset: RecordId,
    len: usize,
}

impl IdentifierSpace {
    pub(crate) fn new(offset: RecordId, len: usize) -> Self {
        Self { offset, len }
    }

    /// Largest base identifier, `None` for an empty base dataset.
    pub fn max_base_id(&self) -> Option<RecordId> {
        if self.len == 0 {
            None
        } else {
            Some(self.offset + self.len as RecordId - 1)
        }
    }

    /// True when `id` belongs to the base run.
    pub fn contains(&self, id: RecordId) -> bool {
        self.len > 0 && id >= self.offset && id <= self.offset + self.len as RecordId - 1
    }

    /// Number of base identifiers.
    pub fn base_len(&self) -> usize {
        self.len
    }

    /// Base identifiers in natural order.
    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        (0..self.len as RecordId).map(move |idx| self.offset + idx)
    }
}

/// Base dataset held in memory with validated contiguous identifiers.
#[derive(Clone, Debug)]
pub struct BaseDataset {
    schema: Schema,
    records: Vec<Record>,
    offset: RecordId,
}

impl BaseDataset {
    /// Build a base dataset from already-parsed records, validating that
    /// identifiers are contiguous in order and start at 0 or 1.
    pub fn from_records(schema: Schema, records: Vec<Record>) -> Result<Self, MixError> {
        let offset = match records.first() {
            Some(first) if first.id <= 1 => first.id,
            Some(first) => {
                return Err(MixError::IdentifierLayout {
                    dataset: "in-memory records".to_string(),
                    reason: format!("base identifiers must start at 0 or 1, found {}", first.id),
                });
            }
            None => 0,
        };
        for (position, record) in records.iter().enumerate() {
            let expected = offset + position as RecordId;
            if record.id != expected {
                return Err(MixError::IdentifierLayout {
                    dataset: "in-memory records".to_string(),
                    reason: format!(
                        "base identifiers must be contiguous: position {position} expects {expected}, found {}",
                        record.id
                    ),
                });
            }
        }
        Ok(Self {
            schema,
            records,
            offset,
        })
    }

    /// Declared attribute layout.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Identifier partition implied by this dataset.
    pub fn id_space(&self) -> IdentifierSpace {
        IdentifierSpace::new(self.offset, self.records.len())
    }

    /// Number of base records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for base identifier `id`.
    pub fn record(&self, id: RecordId) -> Result<&Record, MixError> {
        let position = id
            .checked_sub(self.offset)
            .map(|p| p as usize)
            .filter(|p| *p < self.records.len())
            .ok_or(MixError::MissingRecord { id })?;
        Ok(&self.records[position])
    }

    /// Records in identifier order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

/// Load the base dataset from `path`.
pub fn load_base(path: &Path, schema: &Schema) -> Result<BaseDataset, MixError> {
    let mut records = Vec::new();
    stream_rows(path, schema, |record| {
        records.push(record);
        Ok(())
    })?;
    let dataset = BaseDataset::from_records(schema.clone(), records).map_err(|err| match err {
        MixError::IdentifierLayout { reason, .. } => MixError::IdentifierLayout {
            dataset: path.display().to_string(),
            reason,
        },
        other => other,
    })?;
    debug!(
        path = %path.display(),
        records = dataset.len(),
        max_base_id = ?dataset.id_space().max_base_id(),
        "loaded base dataset"
    );
    Ok(dataset)
}

/// Load the noise dataset from `path`, validating that every identifier is
/// unique and strictly above the base run.
pub fn load_noise(
    path: &Path,
    schema: &Schema,
    space: &IdentifierSpace,
) -> Result<Vec<Record>, MixError> {
    let mut guard = NoiseGuard::new(space, path);
    let mut records = Vec::new();
    stream_rows(path, schema, |record| {
        guard.admit(record.id)?;
        records.push(record);
        Ok(())
    })?;
    debug!(path = %path.display(), records = records.len(), "loaded noise dataset");
    Ok(records)
}

/// Stream every data row of a dataset file through `sink`.
///
/// Skips exactly one header line. Row parse failures carry the path and
/// 1-based line number of the offending line.
pub(crate) fn stream_rows(
    path: &Path,
    schema: &Schema,
    mut sink: impl FnMut(Record) -> Result<(), MixError>,
) -> Result<(), MixError> {
    if !path.exists() {
        return Err(MixError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();
    if lines.next().transpose()?.is_none() {
        return Ok(());
    }
    for (idx, line) in lines.enumerate() {
        let line = line?;
        let record = parse_row(&line, schema).map_err(|source| MixError::Format {
            path: path.to_path_buf(),
            line: idx + 2,
            source,
        })?;
        sink(record)?;
    }
    Ok(())
}

/// Streaming admission check for noise identifiers: uniqueness plus the
/// strict `id > max base id` partition.
pub(crate) struct NoiseGuard<'a> {
    space: &'a IdentifierSpace,
    seen: HashSet<RecordId>,
    dataset: String,
}

impl<'a> NoiseGuard<'a> {
    pub(crate) fn new(space: &'a IdentifierSpace, path: &Path) -> Self {
        Self {
            space,
            seen: HashSet::new(),
            dataset: path.display().to_string(),
        }
    }

    pub(crate) fn admit(&mut self, id: RecordId) -> Result<(), MixError> {
        if let Some(max_base_id) = self.space.max_base_id()
            && id <= max_base_id
        {
            return Err(MixError::IdentifierLayout {
                dataset: self.dataset.clone(),
                reason: format!(
                    "noise identifier {id} overlaps the base range (max base id {max_base_id})"
                ),
            });
        }
        if !self.seen.insert(id) {
            return Err(MixError::IdentifierLayout {
                dataset: self.dataset.clone(),
                reason: format!("duplicate noise identifier {id}"),
            });
        }
        Ok(())
    }
}
