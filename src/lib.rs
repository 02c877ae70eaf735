#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Run parameter types and the JSON parameter file loader.
pub mod config;
/// Centralized constants used across the codec, engine, store, and
/// generators.
pub mod constants;
/// Whole-file dataset loading and identifier-space validation.
pub mod dataset;
/// Merge-job discovery on disk.
pub mod discover;
/// Sign resolution and the merge engine.
pub mod mix;
/// Deterministic emission-order construction.
pub mod order;
/// Point-query workload generation.
pub mod queries;
/// Fixed-arity delimited row codec.
pub mod record;
mod rng;
/// Noise record sources (in-memory and store-backed).
pub mod source;
/// Indexed backing store for large noise datasets.
pub mod store;
/// Seeded synthetic dataset generation.
pub mod synth;
/// Shared type aliases.
pub mod types;
/// Merged-stream output rendering.
pub mod writer;

mod errors;

pub use config::{BenchParams, MixOptions, SynthProfile, WorkloadProfile, load_params};
pub use dataset::{BaseDataset, IdentifierSpace, load_base, load_noise};
pub use discover::{MixJob, discover_jobs};
pub use errors::MixError;
pub use mix::{MixSummary, SignResolver, mix_stream};
pub use order::EmissionOrder;
pub use queries::{PointQuery, generate_queries};
pub use record::{
    AttrValue, ColumnKind, Record, RowFormatError, Schema, Sign, parse_row, render_row,
};
pub use source::{EventRef, InMemoryNoise, NoiseSource, StoreBackedNoise};
pub use store::NoiseStore;
pub use synth::{generate_base, generate_noise, generate_reference};
pub use types::{FileSuffix, RecordId, RowLine};
pub use writer::{StreamWriter, write_count_artifact};
