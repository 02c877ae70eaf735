//! Seeded synthetic dataset generation.
//!
//! Produces the base (residual) and noise input files the merge engine
//! consumes, plus the pre-merged reference file used for exact query answers.
//! Attribute columns are drawn from a Zipfian distribution followed by
//! uniform columns; sub-seeds are fixed per stream so regeneration is exact.

use std::path::Path;

use rand::Rng;
use rand_distr::{Distribution, Zipf};
use tracing::info;

use crate::config::SynthProfile;
use crate::constants::synth::{BASE_STREAM_SEED, NOISE_ALPHA_OFFSET, NOISE_STREAM_SEED};
use crate::errors::MixError;
use crate::record::{AttrValue, Record, Sign};
use crate::rng::DeterministicRng;
use crate::types::RecordId;
use crate::writer::StreamWriter;

/// Deterministic per-record attribute sampler.
struct AttrSampler {
    zipf: Option<Zipf<f64>>,
    rng: DeterministicRng,
    zipf_attrs: usize,
    uniform_attrs: usize,
    domain: u64,
}

impl AttrSampler {
    fn new(profile: &SynthProfile, alpha: f64, seed: u64) -> Result<Self, MixError> {
        let zipf = if profile.zipf_attrs > 0 {
            let distribution = Zipf::new(profile.domain as f64, alpha).map_err(|err| {
                MixError::Configuration(format!(
                    "invalid Zipf parameters (domain {}, exponent {alpha}): {err}",
                    profile.domain
                ))
            })?;
            Some(distribution)
        } else {
            None
        };
        Ok(Self {
            zipf,
            rng: DeterministicRng::new(seed),
            zipf_attrs: profile.zipf_attrs,
            uniform_attrs: profile.uniform_attrs,
            domain: profile.domain,
        })
    }

    fn record(&mut self, id: RecordId) -> Record {
        let mut attrs = Vec::with_capacity(self.zipf_attrs + self.uniform_attrs);
        if let Some(zipf) = &self.zipf {
            for _ in 0..self.zipf_attrs {
                attrs.push(AttrValue::Int(zipf.sample(&mut self.rng) as i64));
            }
        }
        for _ in 0..self.uniform_attrs {
            attrs.push(AttrValue::Int(self.rng.random_range(0..self.domain) as i64));
        }
        Record { id, attrs }
    }
}

/// Generate the base (residual) dataset at `path`: identifiers `0..2^f`,
/// every row an insert. Returns the record count.
pub fn generate_base(profile: &SynthProfile, path: &Path) -> Result<usize, MixError> {
    let profile = profile.validated()?;
    let mut sampler = AttrSampler::new(&profile, profile.zipf_alpha, BASE_STREAM_SEED)?;
    let mut writer = StreamWriter::create(path, &profile.schema())?;
    for id in 0..profile.dataset_size() as RecordId {
        let record = sampler.record(id);
        writer.write_event(&record, Sign::Insert)?;
    }
    let rows = writer.finish()?;
    info!(path = %path.display(), rows, "generated base dataset");
    Ok(rows as usize)
}

/// Generate a noise dataset at `path`: identifiers starting at the base
/// size (disjoint from and above every base identifier), drawn with a
/// flatter Zipf exponent. Returns the record count.
pub fn generate_noise(profile: &SynthProfile, fraction: f64, path: &Path) -> Result<usize, MixError> {
    let profile = profile.validated()?;
    let alpha = profile.zipf_alpha - NOISE_ALPHA_OFFSET;
    let mut sampler = AttrSampler::new(&profile, alpha, NOISE_STREAM_SEED)?;
    let mut writer = StreamWriter::create(path, &profile.schema())?;
    let first = profile.dataset_size() as RecordId;
    for offset in 0..profile.noise_size(fraction) as RecordId {
        let record = sampler.record(first + offset);
        writer.write_event(&record, Sign::Insert)?;
    }
    let rows = writer.finish()?;
    info!(path = %path.display(), rows, fraction, "generated noise dataset");
    Ok(rows as usize)
}

/// Generate the pre-merged reference file at `path`: the base dataset once,
/// then each noise record twice (insert immediately followed by its delete),
/// unshuffled. Returns the row count.
pub fn generate_reference(
    profile: &SynthProfile,
    fraction: f64,
    path: &Path,
) -> Result<usize, MixError> {
    let profile = profile.validated()?;
    let mut base = AttrSampler::new(&profile, profile.zipf_alpha, BASE_STREAM_SEED)?;
    let mut noise = AttrSampler::new(
        &profile,
        profile.zipf_alpha - NOISE_ALPHA_OFFSET,
        NOISE_STREAM_SEED,
    )?;
    let mut writer = StreamWriter::create(path, &profile.schema())?;
    let base_size = profile.dataset_size() as RecordId;
    for id in 0..base_size {
        let record = base.record(id);
        writer.write_event(&record, Sign::Insert)?;
    }
    for offset in 0..profile.noise_size(fraction) as RecordId {
        let record = noise.record(base_size + offset);
        writer.write_event(&record, Sign::Insert)?;
        writer.write_event(&record, Sign::Delete)?;
    }
    let rows = writer.finish()?;
    info!(path = %path.display(), rows, fraction, "generated reference dataset");
    Ok(rows as usize)
}
