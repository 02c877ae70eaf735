use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::RowFormatError;
use crate::types::RecordId;

/// Error type for dataset loading, merging, and generation failures.
///
/// None of these are recovered locally: each aborts the current run, and a
/// run that did not finish cleanly must be treated as having produced no
/// output, whatever bytes it left on disk.
#[derive(Debug, Error)]
pub enum MixError {
    #[error("required input file is missing: {path}")]
    MissingFile { path: PathBuf },
    #[error("malformed row in '{path}' at line {line}: {source}")]
    Format {
        path: PathBuf,
        line: usize,
        #[source]
        source: RowFormatError,
    },
    #[error("dataset '{dataset}' violates identifier layout: {reason}")]
    IdentifierLayout { dataset: String, reason: String },
    #[error("no backing record for noise identifier {id}")]
    MissingRecord { id: RecordId },
    #[error("record identity mismatch: expected identifier {expected}, row carries {actual}")]
    RecordIdentity { expected: RecordId, actual: RecordId },
    #[error("stream invariant violated: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
}
