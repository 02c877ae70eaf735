//! Fixed-arity delimited row codec.
//!
//! Every dataset and stream file shares one shape: a leading identifier,
//! a fixed number of attribute columns, and one trailing marker column.
//! Parsing is strict. A wrong field count or a bad integer literal fails the
//! row, because a single silently skipped row invalidates every downstream
//! counting invariant.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::codec::{
    ATTR_COLUMN_PREFIX, DELETE_LABEL, DELIMITER, ID_COLUMN, INSERT_LABEL, SIGN_COLUMN,
};
use crate::types::RecordId;

/// Event polarity attached to every output row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    /// The record enters the stream.
    Insert,
    /// The record leaves the stream.
    Delete,
}

impl Sign {
    /// Wire form written to the trailing `sign` column.
    pub fn label(self) -> &'static str {
        match self {
            Sign::Insert => INSERT_LABEL,
            Sign::Delete => DELETE_LABEL,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Column kind for one attribute position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Parsed as a signed 64-bit integer; negative literals are valid.
    Integer,
    /// Copied verbatim, no numeric validation.
    Text,
}

/// Declared attribute layout of one dataset family.
///
/// Rows carry `arity + 2` delimited fields: the identifier, the attributes,
/// and one trailing marker column that loaders replace with provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnKind>,
}

impl Schema {
    /// Schema with `arity` integer attribute columns.
    pub fn numeric(arity: usize) -> Self {
        Self {
            columns: vec![ColumnKind::Integer; arity],
        }
    }

    /// Schema with `arity` verbatim text attribute columns (annotated
    /// trace families).
    pub fn text(arity: usize) -> Self {
        Self {
            columns: vec![ColumnKind::Text; arity],
        }
    }

    /// Schema with explicit per-position column kinds.
    pub fn with_columns(columns: Vec<ColumnKind>) -> Self {
        Self { columns }
    }

    /// Number of attribute columns (excludes the identifier and the trailing
    /// marker column).
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Total delimited fields per row.
    pub fn field_count(&self) -> usize {
        self.arity() + 2
    }

    /// Declared kind for attribute position `idx`.
    pub fn column(&self, idx: usize) -> ColumnKind {
        self.columns[idx]
    }

    /// Header line: `id,attr1,...,attrN,sign`.
    pub fn header(&self) -> String {
        let mut header = String::from(ID_COLUMN);
        for idx in 1..=self.arity() {
            header.push(DELIMITER);
            header.push_str(ATTR_COLUMN_PREFIX);
            header.push_str(&idx.to_string());
        }
        header.push(DELIMITER);
        header.push_str(SIGN_COLUMN);
        header
    }
}

/// One attribute value.
#[derive(Clone, Debug, PartialEq, Eq, bitcode::Encode, bitcode::Decode)]
pub enum AttrValue {
    /// Integer column value.
    Int(i64),
    /// Verbatim text column value.
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(value) => write!(f, "{value}"),
            AttrValue::Text(value) => f.write_str(value),
        }
    }
}

/// One immutable parsed row: identifier plus fixed-arity attributes.
#[derive(Clone, Debug, PartialEq, Eq, bitcode::Encode, bitcode::Decode)]
pub struct Record {
    /// Identifier from the leading column.
    pub id: RecordId,
    /// Attribute values in declared column order.
    pub attrs: Vec<AttrValue>,
}

/// Row-level parse failure, contextualized with path and line by loaders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowFormatError {
    #[error("expected {expected} delimited fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("column '{column}' holds a non-integer value '{value}'")]
    Integer { column: String, value: String },
}

/// Parse one data row against `schema`.
///
/// The trailing marker column is validated for presence but its content is
/// ignored; provenance is decided by the loader, not by the file.
pub fn parse_row(line: &str, schema: &Schema) -> Result<Record, RowFormatError> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    if fields.len() != schema.field_count() {
        return Err(RowFormatError::FieldCount {
            expected: schema.field_count(),
            found: fields.len(),
        });
    }
    let id: RecordId = fields[0].parse().map_err(|_| RowFormatError::Integer {
        column: ID_COLUMN.to_string(),
        value: fields[0].to_string(),
    })?;
    let mut attrs = Vec::with_capacity(schema.arity());
    for (idx, field) in fields[1..=schema.arity()].iter().enumerate() {
        let value = match schema.column(idx) {
            ColumnKind::Integer => {
                AttrValue::Int(field.parse().map_err(|_| RowFormatError::Integer {
                    column: format!("{ATTR_COLUMN_PREFIX}{}", idx + 1),
                    value: (*field).to_string(),
                })?)
            }
            ColumnKind::Text => AttrValue::Text((*field).to_string()),
        };
        attrs.push(value);
    }
    Ok(Record { id, attrs })
}

/// Render one stream row: identifier, attributes, trailing sign.
///
/// Never fails for a well-formed record.
pub fn render_row(record: &Record, sign: Sign) -> String {
    let mut line = record.id.to_string();
    for attr in &record.attrs {
        line.push(DELIMITER);
        line.push_str(&attr.to_string());
    }
    line.push(DELIMITER);
    line.push_str(sign.label());
    line
}
