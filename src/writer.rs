//! Merged-stream output rendering.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::constants::discover::COUNT_FILENAME;
use crate::errors::MixError;
use crate::record::{Record, Schema, Sign, render_row};
use crate::store::ensure_parent_dir;

/// Buffered writer for one merged stream file.
///
/// Writes the fixed header on creation, then one rendered row per event in
/// the order they are handed in. The emission order decides that order;
/// nothing is re-sorted here.
pub struct StreamWriter {
    out: BufWriter<File>,
    rows: u64,
}

impl StreamWriter {
    /// Create the stream file (and missing parent directories) and write the
    /// header line.
    pub fn create(path: &Path, schema: &Schema) -> Result<Self, MixError> {
        ensure_parent_dir(path)?;
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(schema.header().as_bytes())?;
        out.write_all(b"\n")?;
        Ok(Self { out, rows: 0 })
    }

    /// Append one event row.
    pub fn write_event(&mut self, record: &Record, sign: Sign) -> Result<(), MixError> {
        self.out.write_all(render_row(record, sign).as_bytes())?;
        self.out.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and return the emitted row count.
    pub fn finish(mut self) -> Result<u64, MixError> {
        self.out.flush()?;
        Ok(self.rows)
    }
}

/// Write the sibling row-count artifact next to `stream_path` so downstream
/// tooling can sanity-check the stream without re-reading it.
pub fn write_count_artifact(stream_path: &Path, rows: u64) -> Result<PathBuf, MixError> {
    let path = stream_path.with_file_name(COUNT_FILENAME);
    fs::write(&path, rows.to_string())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AttrValue;
    use tempfile::tempdir;

    #[test]
    fn writes_header_then_rows_in_hand_in_order() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("out/final_stream.csv");
        let mut writer = StreamWriter::create(&path, &Schema::numeric(2)).unwrap();
        let record = Record {
            id: 3,
            attrs: vec![AttrValue::Int(1), AttrValue::Int(2)],
        };
        writer.write_event(&record, Sign::Insert).unwrap();
        writer.write_event(&record, Sign::Delete).unwrap();
        let rows = writer.finish().unwrap();
        assert_eq!(rows, 2);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,attr1,attr2,sign\n3,1,2,1\n3,1,2,-1\n");
    }

    #[test]
    fn count_artifact_lands_beside_the_stream() {
        let temp = tempdir().unwrap();
        let stream = temp.path().join("final_stream.csv");
        let count = write_count_artifact(&stream, 9).unwrap();
        assert_eq!(count, temp.path().join("count.txt"));
        assert_eq!(fs::read_to_string(&count).unwrap(), "9");
    }
}
