use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::MANIFEST_FILE;
use crate::error::Result;
use crate::ingest::IngestReport;
use crate::pipeline::StageReport;

/// Content fingerprint of one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFingerprint {
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: u64,
}

impl InputFingerprint {
    pub fn of_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let bytes = io::copy(&mut file, &mut hasher)?;
        Ok(Self {
            path: path.to_path_buf(),
            sha256: hex::encode(hasher.finalize()),
            bytes,
        })
    }
}

/// Record of one cleaning run, written next to the output tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub inputs: Vec<InputFingerprint>,
    pub ingest: IngestReport,
    pub stages: StageReport,
    pub sinks: Vec<String>,
    pub keep_unattributed: bool,
    pub unknown_sentinel: String,
}

impl RunManifest {
    pub fn start(keep_unattributed: bool, unknown_sentinel: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            inputs: Vec::new(),
            ingest: IngestReport::default(),
            stages: StageReport::default(),
            sinks: Vec::new(),
            keep_unattributed,
            unknown_sentinel: unknown_sentinel.to_string(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = Self::path_in(dir);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn read_from(dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(Self::path_in(dir))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// True when both runs read byte-identical inputs with the same settings
    pub fn same_inputs_as(&self, other: &RunManifest) -> bool {
        self.inputs.len() == other.inputs.len()
            && self
                .inputs
                .iter()
                .zip(&other.inputs)
                .all(|(a, b)| a.sha256 == b.sha256)
            && self.keep_unattributed == other.keep_unattributed
            && self.unknown_sentinel == other.unknown_sentinel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        fs::write(&path, "abc").unwrap();

        let fp = InputFingerprint::of_file(&path).unwrap();
        assert_eq!(fp.bytes, 3);
        assert_eq!(
            fp.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_write_and_compare() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("artworks.csv");
        fs::write(&input, "ObjectID\n1\n").unwrap();

        let mut first = RunManifest::start(false, "Unknown");
        first.inputs.push(InputFingerprint::of_file(&input).unwrap());
        first.finish();
        first.write_to(dir.path()).unwrap();

        let read = RunManifest::read_from(dir.path()).unwrap();
        assert_eq!(read.run_id, first.run_id);
        assert!(read.finished_at.is_some());

        let mut second = RunManifest::start(false, "Unknown");
        second.inputs.push(InputFingerprint::of_file(&input).unwrap());
        assert!(second.same_inputs_as(&read));

        fs::write(&input, "ObjectID\n2\n").unwrap();
        let mut third = RunManifest::start(false, "Unknown");
        third.inputs.push(InputFingerprint::of_file(&input).unwrap());
        assert!(!third.same_inputs_as(&read));
    }
}
