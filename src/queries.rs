//! Point-query workload generation.
//!
//! Samples base records as query templates, blanks attribute positions down
//! to per-level predicate counts, deduplicates, and counts exact and union
//! answers over the base dataset. Workloads accompany generated datasets so
//! benchmark harnesses can score approximate answers without rescanning.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::config::WorkloadProfile;
use crate::constants::codec::{ATTR_COLUMN_PREFIX, DELIMITER, ID_COLUMN};
use crate::constants::queries::{
    ANSWER_COLUMN, PREDICATE_SEED, SELECTION_SEED, UNION_COLUMN, WILDCARD,
};
use crate::dataset::BaseDataset;
use crate::errors::MixError;
use crate::record::AttrValue;
use crate::rng::DeterministicRng;
use crate::store::ensure_parent_dir;

/// One point query: per-position predicates (`-1` marks an unbound
/// position) plus its exact and union answer counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointQuery {
    /// Predicate value per attribute position.
    pub predicates: Vec<i64>,
    /// Records matching every bound predicate.
    pub answer: u64,
    /// Records matching at least one bound predicate.
    pub union: u64,
}

/// Generate a query workload from `base` and write it to `path`.
///
/// Sampling and wildcarding are seeded, so the workload for a given dataset
/// and profile is reproducible. Returns the deduplicated queries in file
/// order.
pub fn generate_queries(
    base: &BaseDataset,
    profile: &WorkloadProfile,
    path: &Path,
) -> Result<Vec<PointQuery>, MixError> {
    let arity = base.schema().arity();
    if profile.num_predicates == 0 || profile.num_predicates > arity {
        return Err(MixError::Configuration(format!(
            "predicate levels must lie in 1..={arity}, got {}",
            profile.num_predicates
        )));
    }
    let matrix = integer_matrix(base)?;

    let mut selector = DeterministicRng::new(SELECTION_SEED);
    let target = profile.num_queries.min(base.len());
    let mut selected = HashSet::new();
    while selected.len() < target {
        selected.insert(selector.random_range(0..base.len()));
    }

    // One template per selected record and predicate level; level p keeps
    // p + 1 bound attributes.
    let mut wildcarder = DeterministicRng::new(PREDICATE_SEED);
    let mut seen_keys = HashSet::new();
    let mut queries: Vec<Vec<i64>> = Vec::new();
    for (position, values) in matrix.iter().enumerate() {
        if !selected.contains(&position) {
            continue;
        }
        for level in 0..profile.num_predicates {
            let mut query = values.clone();
            blank_to_level(&mut query, level + 1, &mut wildcarder);
            if seen_keys.insert(query_key(&query)) {
                queries.push(query);
            }
        }
    }

    let mut answers = vec![0u64; queries.len()];
    let mut unions = vec![0u64; queries.len()];
    for values in &matrix {
        for (idx, query) in queries.iter().enumerate() {
            let mut matches = true;
            let mut union_match = false;
            for (position, &predicate) in query.iter().enumerate() {
                if predicate == WILDCARD {
                    continue;
                }
                if predicate == values[position] {
                    union_match = true;
                } else {
                    matches = false;
                }
            }
            if matches {
                answers[idx] += 1;
            }
            if union_match {
                unions[idx] += 1;
            }
        }
    }

    let workload: Vec<PointQuery> = queries
        .into_iter()
        .zip(answers.into_iter().zip(unions))
        .map(|(predicates, (answer, union))| PointQuery {
            predicates,
            answer,
            union,
        })
        .collect();
    write_workload(&workload, arity, path)?;
    info!(path = %path.display(), queries = workload.len(), "generated query workload");
    Ok(workload)
}

/// Base attribute values as integers; query workloads only apply to
/// integer-typed families.
fn integer_matrix(base: &BaseDataset) -> Result<Vec<Vec<i64>>, MixError> {
    base.records()
        .iter()
        .map(|record| {
            record
                .attrs
                .iter()
                .map(|attr| match attr {
                    AttrValue::Int(value) => Ok(*value),
                    AttrValue::Text(_) => Err(MixError::Configuration(
                        "query workloads require integer-typed columns".to_string(),
                    )),
                })
                .collect()
        })
        .collect()
}

/// Blank random positions until only `bound` predicates remain.
fn blank_to_level(query: &mut [i64], bound: usize, rng: &mut DeterministicRng) {
    let mut blanked = 0;
    while blanked < query.len() - bound {
        let position = rng.random_range(0..query.len());
        if query[position] != WILDCARD {
            query[position] = WILDCARD;
            blanked += 1;
        }
    }
}

/// Dedup key over bound positions only.
fn query_key(query: &[i64]) -> String {
    let mut key = String::new();
    for (position, &predicate) in query.iter().enumerate() {
        if predicate != WILDCARD {
            key.push_str(&format!("{position}:{predicate};"));
        }
    }
    key
}

fn write_workload(workload: &[PointQuery], arity: usize, path: &Path) -> Result<(), MixError> {
    ensure_parent_dir(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    let mut header = String::from(ID_COLUMN);
    for idx in 1..=arity {
        header.push(DELIMITER);
        header.push_str(ATTR_COLUMN_PREFIX);
        header.push_str(&idx.to_string());
    }
    header.push(DELIMITER);
    header.push_str(ANSWER_COLUMN);
    header.push(DELIMITER);
    header.push_str(UNION_COLUMN);
    out.write_all(header.as_bytes())?;
    out.write_all(b"\n")?;
    for (idx, query) in workload.iter().enumerate() {
        let mut line = idx.to_string();
        for predicate in &query.predicates {
            line.push(DELIMITER);
            line.push_str(&predicate.to_string());
        }
        line.push(DELIMITER);
        line.push_str(&query.answer.to_string());
        line.push(DELIMITER);
        line.push_str(&query.union.to_string());
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
