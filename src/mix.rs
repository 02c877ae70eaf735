//! The merge engine: sign resolution plus the batched emission loop.
//!
//! One parametrized engine serves every storage backend and schema width.
//! The run owns its transient state (the open-identifier set, the event
//! buffer) and tears it down when it returns; nothing here is process-wide.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::MixOptions;
use crate::dataset::{BaseDataset, IdentifierSpace};
use crate::errors::MixError;
use crate::order::EmissionOrder;
use crate::record::Sign;
use crate::source::{EventRef, NoiseSource};
use crate::types::RecordId;
use crate::writer::{StreamWriter, write_count_artifact};

/// Per-run sign assignment state machine.
///
/// Base identifiers are always inserts. A noise identifier's first occurrence
/// opens it (insert); the second closes it (delete). The open set must be
/// empty once the emission order is fully consumed.
pub struct SignResolver {
    space: IdentifierSpace,
    open: HashSet<RecordId>,
}

impl SignResolver {
    /// Resolver over the given identifier partition, with an empty open set.
    pub fn new(space: IdentifierSpace) -> Self {
        Self {
            space,
            open: HashSet::new(),
        }
    }

    /// Assign the sign for the next occurrence of `id`.
    pub fn resolve(&mut self, id: RecordId) -> Result<Sign, MixError> {
        if self.space.contains(id) {
            return Ok(Sign::Insert);
        }
        if self.open.insert(id) {
            Ok(Sign::Insert)
        } else if self.open.remove(&id) {
            Ok(Sign::Delete)
        } else {
            // Cannot occur while the emission order lists every noise
            // identifier exactly twice.
            Err(MixError::InvariantViolation(format!(
                "identifier {id} was marked open but could not be closed"
            )))
        }
    }

    /// Number of noise identifiers currently between insert and delete.
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Terminal gate: every opened identifier must have been closed.
    pub fn finish(&self) -> Result<(), MixError> {
        if !self.open.is_empty() {
            return Err(MixError::InvariantViolation(format!(
                "{} noise identifiers remain open after the stream ended",
                self.open.len()
            )));
        }
        Ok(())
    }
}

/// Outcome of one successful merge run.
#[derive(Clone, Debug)]
pub struct MixSummary {
    /// Data rows emitted (excludes the header).
    pub rows: u64,
    /// Base records merged.
    pub base_records: usize,
    /// Distinct noise records merged (each contributes two rows).
    pub noise_records: usize,
    /// Stream file written.
    pub stream_path: PathBuf,
    /// Sibling count artifact, when emitted.
    pub count_path: Option<PathBuf>,
}

/// Merge `base` and `noise` into the stream file at `stream_path`.
///
/// Every base record is emitted once as an insert; every noise record twice,
/// insert then delete, in seeded-shuffled order. Backed sources have their
/// lookups batched: events accumulate in a bounded buffer, the buffer's noise
/// events are staged as one query, then the buffer drains strictly in
/// emission order. Rerunning with identical inputs and seed reproduces the
/// stream byte for byte.
pub fn mix_stream<S: NoiseSource>(
    base: &BaseDataset,
    noise: &mut S,
    options: &MixOptions,
    stream_path: &Path,
) -> Result<MixSummary, MixError> {
    let options = options.validated()?;
    let space = base.id_space();
    let noise_ids = noise.ids();
    let order = EmissionOrder::build(&space, &noise_ids, options.seed);
    info!(
        base = base.len(),
        noise = noise_ids.len(),
        events = order.len(),
        seed = options.seed,
        stream = %stream_path.display(),
        "merging event stream"
    );

    let mut resolver = SignResolver::new(space);
    let mut writer = StreamWriter::create(stream_path, base.schema())?;
    let mut buffer: Vec<EventRef> = Vec::new();
    let mut staged: Vec<EventRef> = Vec::new();
    let total = order.len();
    for (idx, id) in order.iter().enumerate() {
        let sign = resolver.resolve(id)?;
        let event = EventRef { id, sign };
        buffer.push(event);
        if !space.contains(id) {
            staged.push(event);
        }
        if buffer.len() >= options.fetch_batch || idx + 1 == total {
            noise.stage(&staged)?;
            staged.clear();
            for event in buffer.drain(..) {
                if space.contains(event.id) {
                    let record = base.record(event.id)?;
                    check_identity(record.id, event.id)?;
                    writer.write_event(record, event.sign)?;
                } else {
                    let record = noise.resolve(event)?;
                    check_identity(record.id, event.id)?;
                    writer.write_event(&record, event.sign)?;
                }
            }
            debug!(
                written = writer.rows(),
                total,
                open = resolver.open_len(),
                "flushed event batch"
            );
        }
    }

    resolver.finish()?;
    noise.finish()?;
    let rows = writer.finish()?;
    let count_path = if options.emit_count {
        Some(write_count_artifact(stream_path, rows)?)
    } else {
        None
    };
    info!(rows, stream = %stream_path.display(), "merged stream complete");
    Ok(MixSummary {
        rows,
        base_records: base.len(),
        noise_records: noise_ids.len(),
        stream_path: stream_path.to_path_buf(),
        count_path,
    })
}

fn check_identity(actual: RecordId, expected: RecordId) -> Result<(), MixError> {
    if actual != expected {
        return Err(MixError::RecordIdentity { expected, actual });
    }
    Ok(())
}
