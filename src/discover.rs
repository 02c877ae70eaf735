//! Dataset discovery.
//!
//! Locates merge jobs on disk: every directory holding a base (residual)
//! file yields one job, with the suffix-matched noise file attached when it
//! exists beside it. Discovery only produces path triples; it never opens
//! the files.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::constants::discover::{BASE_STEM, COUNT_FILENAME, DATASET_EXT, NOISE_STEM, STREAM_STEM};
use crate::errors::MixError;
use crate::types::FileSuffix;

/// One merge job located on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixJob {
    /// Base dataset file.
    pub base: PathBuf,
    /// Sibling noise dataset, when present.
    pub noise: Option<PathBuf>,
    /// Merged stream output path.
    pub stream: PathBuf,
    /// Dataset-family suffix shared by the job's files.
    pub suffix: FileSuffix,
}

impl MixJob {
    /// Sibling row-count artifact path for this job's stream.
    pub fn count_path(&self) -> PathBuf {
        self.stream.with_file_name(COUNT_FILENAME)
    }
}

/// Find every merge job under `root`.
///
/// A file named `residual<suffix>.csv` yields a job; `noise_inserts<suffix>.csv`
/// beside it is attached when present, and the stream output
/// `final_stream<suffix>.csv` lands in the same directory. Jobs come back in
/// path order so repeated scans enumerate identically.
pub fn discover_jobs(root: &Path) -> Result<Vec<MixJob>, MixError> {
    if !root.is_dir() {
        return Err(MixError::MissingFile {
            path: root.to_path_buf(),
        });
    }
    let extension = format!(".{DATASET_EXT}");
    let mut jobs = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy();
        let Some(suffix) = name
            .strip_prefix(BASE_STEM)
            .and_then(|rest| rest.strip_suffix(&extension))
        else {
            continue;
        };
        let dir = entry.path().parent().unwrap_or(root);
        let noise = dir.join(format!("{NOISE_STEM}{suffix}{extension}"));
        jobs.push(MixJob {
            base: entry.path().to_path_buf(),
            noise: noise.exists().then_some(noise),
            stream: dir.join(format!("{STREAM_STEM}{suffix}{extension}")),
            suffix: suffix.to_string(),
        });
    }
    jobs.sort_by(|a, b| a.base.cmp(&b.base));
    debug!(root = %root.display(), jobs = jobs.len(), "discovered merge jobs");
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_suffixed_jobs_and_attaches_noise() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("1.3/10");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("residual_0.33.csv"), "id,attr1,sign\n").unwrap();
        fs::write(nested.join("noise_inserts_0.33.csv"), "id,attr1,sign\n").unwrap();
        fs::write(temp.path().join("residual.csv"), "id,attr1,sign\n").unwrap();
        fs::write(temp.path().join("unrelated.csv"), "").unwrap();

        let jobs = discover_jobs(temp.path()).unwrap();
        assert_eq!(jobs.len(), 2);

        let suffixed = jobs
            .iter()
            .find(|job| job.suffix == "_0.33")
            .expect("suffixed job");
        assert_eq!(
            suffixed.noise.as_deref(),
            Some(nested.join("noise_inserts_0.33.csv").as_path())
        );
        assert_eq!(suffixed.stream, nested.join("final_stream_0.33.csv"));
        assert_eq!(suffixed.count_path(), nested.join("count.txt"));

        let bare = jobs.iter().find(|job| job.suffix.is_empty()).expect("bare job");
        assert_eq!(bare.noise, None);
        assert_eq!(bare.stream, temp.path().join("final_stream.csv"));
    }

    #[test]
    fn repeated_scans_enumerate_identically() {
        let temp = tempdir().unwrap();
        for dir in ["b", "a", "c"] {
            let path = temp.path().join(dir);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("residual.csv"), "id,attr1,sign\n").unwrap();
        }
        let first = discover_jobs(temp.path()).unwrap();
        let second = discover_jobs(temp.path()).unwrap();
        assert_eq!(first, second);
        let dirs: Vec<_> = first
            .iter()
            .map(|job| job.base.parent().unwrap().file_name().unwrap().to_owned())
            .collect();
        assert_eq!(dirs, ["a", "b", "c"]);
    }

    #[test]
    fn missing_root_is_reported_before_scanning() {
        let temp = tempdir().unwrap();
        let err = discover_jobs(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, MixError::MissingFile { .. }));
    }
}
