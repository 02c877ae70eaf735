//! Run parameters.
//!
//! Every job family is driven by one JSON parameter file deserialized into
//! [`BenchParams`]; the structs double as the programmatic configuration
//! surface. Validation happens on use, not on load, so partially relevant
//! files stay loadable.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{mix, synth};
use crate::errors::MixError;
use crate::record::Schema;

/// Merge-run tunables.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MixOptions {
    /// Shuffle seed. Identical inputs and seed reproduce the stream byte for
    /// byte; there is no unseeded path.
    pub seed: u64,
    /// Events buffered before backed-store lookups flush as one batched
    /// query. Throughput knob only; capacity 1 produces the same stream.
    pub fetch_batch: usize,
    /// Emit the sibling `count.txt` artifact.
    pub emit_count: bool,
}

impl Default for MixOptions {
    fn default() -> Self {
        Self {
            seed: mix::DEFAULT_SEED,
            fetch_batch: mix::DEFAULT_FETCH_BATCH,
            emit_count: true,
        }
    }
}

impl MixOptions {
    /// Validate that the options are usable.
    pub fn validated(&self) -> Result<Self, MixError> {
        if self.fetch_batch == 0 {
            return Err(MixError::Configuration(
                "fetch batch capacity must be at least 1".to_string(),
            ));
        }
        Ok(*self)
    }
}

/// Synthetic dataset shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthProfile {
    /// Base dataset holds `2^size_factor` records.
    pub size_factor: u32,
    /// Noise dataset sizes as fractions of the base size, one dataset per
    /// entry. `0.0` means a base-only family.
    pub noise_fractions: Vec<f64>,
    /// Number of Zipfian attribute columns.
    pub zipf_attrs: usize,
    /// Number of uniform attribute columns.
    pub uniform_attrs: usize,
    /// Attribute value domain.
    pub domain: u64,
    /// Zipf exponent for base attributes; noise draws with a slightly
    /// flatter exponent.
    pub zipf_alpha: f64,
}

impl Default for SynthProfile {
    fn default() -> Self {
        Self {
            size_factor: 10,
            noise_fractions: vec![0.33],
            zipf_attrs: 5,
            uniform_attrs: 4,
            domain: synth::DEFAULT_DOMAIN,
            zipf_alpha: 1.3,
        }
    }
}

impl SynthProfile {
    /// Base dataset record count.
    pub fn dataset_size(&self) -> usize {
        1usize << self.size_factor
    }

    /// Noise record count for one fraction entry.
    pub fn noise_size(&self, fraction: f64) -> usize {
        (self.dataset_size() as f64 * fraction) as usize
    }

    /// Total attribute columns.
    pub fn arity(&self) -> usize {
        self.zipf_attrs + self.uniform_attrs
    }

    /// Declared layout of generated datasets.
    pub fn schema(&self) -> Schema {
        Schema::numeric(self.arity())
    }

    /// Validate that the profile can be generated.
    pub fn validated(&self) -> Result<Self, MixError> {
        if self.arity() == 0 {
            return Err(MixError::Configuration(
                "at least one attribute column is required".to_string(),
            ));
        }
        if self.domain == 0 {
            return Err(MixError::Configuration(
                "attribute domain must be at least 1".to_string(),
            ));
        }
        if self.size_factor >= usize::BITS {
            return Err(MixError::Configuration(format!(
                "size factor {} overflows the dataset size",
                self.size_factor
            )));
        }
        if self.zipf_attrs > 0 && self.zipf_alpha <= synth::NOISE_ALPHA_OFFSET {
            return Err(MixError::Configuration(format!(
                "zipf exponent must exceed {} so the noise exponent stays positive",
                synth::NOISE_ALPHA_OFFSET
            )));
        }
        if let Some(fraction) = self
            .noise_fractions
            .iter()
            .find(|fraction| !fraction.is_finite() || **fraction < 0.0)
        {
            return Err(MixError::Configuration(format!(
                "noise fraction {fraction} is not a non-negative number"
            )));
        }
        Ok(self.clone())
    }
}

/// Query-workload shape.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadProfile {
    /// Distinct base records sampled as query templates.
    pub num_queries: usize,
    /// Predicate levels per template: level `p` keeps `p + 1` bound
    /// attributes.
    pub num_predicates: usize,
}

impl Default for WorkloadProfile {
    fn default() -> Self {
        Self {
            num_queries: 100,
            num_predicates: 3,
        }
    }
}

/// Top-level parameter file for the command-line driver.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchParams {
    /// Root directory datasets are generated into and discovered from.
    pub root: PathBuf,
    /// Synthetic dataset shape.
    pub synth: SynthProfile,
    /// Query workload shape.
    pub workload: WorkloadProfile,
    /// Merge-run tunables.
    pub mix: MixOptions,
}

/// Load parameters from a JSON file.
pub fn load_params(path: &Path) -> Result<BenchParams, MixError> {
    if !path.exists() {
        return Err(MixError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|err| {
        MixError::Configuration(format!("invalid parameter file '{}': {err}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_parameter_files_fall_back_to_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("params.json");
        fs::write(&path, r#"{"mix": {"seed": 7}, "synth": {"size_factor": 4}}"#).unwrap();
        let params = load_params(&path).unwrap();
        assert_eq!(params.mix.seed, 7);
        assert_eq!(params.mix.fetch_batch, mix::DEFAULT_FETCH_BATCH);
        assert_eq!(params.synth.dataset_size(), 16);
        assert_eq!(params.synth.domain, synth::DEFAULT_DOMAIN);
    }

    #[test]
    fn zero_fetch_batch_is_rejected() {
        let options = MixOptions {
            fetch_batch: 0,
            ..MixOptions::default()
        };
        assert!(matches!(
            options.validated(),
            Err(MixError::Configuration(_))
        ));
    }

    #[test]
    fn profile_without_attributes_is_rejected() {
        let profile = SynthProfile {
            zipf_attrs: 0,
            uniform_attrs: 0,
            ..SynthProfile::default()
        };
        assert!(matches!(
            profile.validated(),
            Err(MixError::Configuration(_))
        ));
    }
}
