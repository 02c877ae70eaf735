/// Constants used by the row codec and stream headers.
pub mod codec {
    /// Field delimiter for every dataset and stream file.
    pub const DELIMITER: char = ',';
    /// Wire form of an insert event sign.
    pub const INSERT_LABEL: &str = "1";
    /// Wire form of a delete event sign.
    pub const DELETE_LABEL: &str = "-1";
    /// Header name of the leading identifier column.
    pub const ID_COLUMN: &str = "id";
    /// Header prefix for attribute columns (`attr1`, `attr2`, ...).
    pub const ATTR_COLUMN_PREFIX: &str = "attr";
    /// Header name of the trailing sign column.
    pub const SIGN_COLUMN: &str = "sign";
}

/// Constants used by the merge engine.
pub mod mix {
    /// Default shuffle seed. Runs repeated with the same inputs and seed
    /// produce byte-identical streams.
    pub const DEFAULT_SEED: u64 = 42;
    /// Default number of events buffered before backed-store lookups are
    /// flushed as one batched query.
    pub const DEFAULT_FETCH_BATCH: usize = 100_000;
    /// Emission progress is logged every this many flushed events.
    pub const PROGRESS_LOG_EVERY: u64 = 100_000;
}

/// Constants used by the noise backing store.
pub mod store {
    /// Key prefix for serialized noise records.
    pub const RECORD_KEY_PREFIX: &[u8] = b"rec:";
    /// Default filename for the transient noise index store.
    pub const DEFAULT_STORE_FILENAME: &str = "noise_index.bin";
    /// Records encoded per batched index write during bulk load.
    pub const BULK_WRITE_BATCH: usize = 100_000;
}

/// Constants used by synthetic dataset generation.
pub mod synth {
    /// Attribute value domain: samples fall in `1..=DEFAULT_DOMAIN` (Zipfian)
    /// or `0..DEFAULT_DOMAIN` (uniform).
    pub const DEFAULT_DOMAIN: u64 = 10_000;
    /// Noise records are drawn with a slightly flatter skew than the base.
    pub const NOISE_ALPHA_OFFSET: f64 = 0.2;
    /// Sub-seed for the base attribute streams.
    pub const BASE_STREAM_SEED: u64 = 0;
    /// Sub-seed for the noise attribute streams.
    pub const NOISE_STREAM_SEED: u64 = 1;
}

/// Constants used by query-workload generation.
pub mod queries {
    /// Wildcard marker for unbound attribute positions.
    pub const WILDCARD: i64 = -1;
    /// Header name of the exact-answer column.
    pub const ANSWER_COLUMN: &str = "answer";
    /// Header name of the union-answer column.
    pub const UNION_COLUMN: &str = "union";
    /// Sub-seed for query index selection.
    pub const SELECTION_SEED: u64 = 0;
    /// Sub-seed for predicate wildcarding.
    pub const PREDICATE_SEED: u64 = 0;
    /// Filename of a generated query workload.
    pub const WORKLOAD_FILENAME: &str = "queries.csv";
}

/// Constants used by dataset discovery and output naming.
pub mod discover {
    /// Filename stem of a base (residual) dataset.
    pub const BASE_STEM: &str = "residual";
    /// Filename stem of a noise dataset.
    pub const NOISE_STEM: &str = "noise_inserts";
    /// Filename stem of the merged stream output.
    pub const STREAM_STEM: &str = "final_stream";
    /// Extension shared by every dataset file.
    pub const DATASET_EXT: &str = "csv";
    /// Filename of the sibling row-count artifact.
    pub const COUNT_FILENAME: &str = "count.txt";
}
