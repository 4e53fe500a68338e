use std::{io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::Sequence;
use tokio::sync::Mutex;
use tracing::info;

/// Where the controller keeps the one sequence it runs.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    async fn load(&self) -> Result<Sequence>;
    async fn save(&self, sequence: &Sequence) -> Result<()>;
}

/// JSON file store. A missing file reads as the empty sequence.
pub struct FileSequenceStore {
    path: PathBuf,
}

impl FileSequenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SequenceStore for FileSequenceStore {
    async fn load(&self) -> Result<Sequence> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "store: no sequence file yet, using empty sequence");
                return Ok(Sequence::default());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read sequence file '{}'", self.path.display())
                })
            }
        };
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid sequence file '{}'", self.path.display()))
    }

    async fn save(&self, sequence: &Sequence) -> Result<()> {
        let raw = serde_json::to_string_pretty(sequence)?;
        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("failed to write sequence file '{}'", self.path.display()))?;
        info!(path = %self.path.display(), steps = sequence.len(), "store: sequence saved");
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySequenceStore {
    sequence: Mutex<Sequence>,
}

impl MemorySequenceStore {
    pub fn new(sequence: Sequence) -> Self {
        Self {
            sequence: Mutex::new(sequence),
        }
    }
}

#[async_trait]
impl SequenceStore for MemorySequenceStore {
    async fn load(&self) -> Result<Sequence> {
        Ok(self.sequence.lock().await.clone())
    }

    async fn save(&self, sequence: &Sequence) -> Result<()> {
        *self.sequence.lock().await = sequence.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Flag, MotorId, MotorTarget, Step};

    fn sample() -> Sequence {
        Sequence {
            looping: Flag::ON,
            start_with_home: Flag::ON,
            steps: vec![Step::default()
                .with_dwell(1.5)
                .with_motor(MotorId::Motor2, MotorTarget::new(20.0, 100.0))],
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty_sequence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSequenceStore::new(dir.path().join("sequence.json"));

        assert_eq!(store.load().await.expect("load"), Sequence::default());
    }

    #[tokio::test]
    async fn file_store_persists_pretty_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sequence.json");
        let store = FileSequenceStore::new(&path);

        store.save(&sample()).await.expect("save");
        assert_eq!(store.load().await.expect("load"), sample());

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\n  \"loop\": 1"), "unexpected layout: {raw}");
    }

    #[tokio::test]
    async fn file_store_reads_legacy_boolean_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sequence.json");
        std::fs::write(&path, r#"{"loop": true, "start_with_home": false, "steps": []}"#)
            .expect("write");

        let sequence = FileSequenceStore::new(&path).load().await.expect("load");
        assert_eq!(sequence.looping, Flag::ON);
        assert_eq!(sequence.start_with_home, Flag::OFF);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sequence.json");
        std::fs::write(&path, "{").expect("write");

        let err = FileSequenceStore::new(&path).load().await.expect_err("must fail");
        assert!(err.to_string().contains("invalid sequence file"), "{err}");
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemorySequenceStore::default();
        assert_eq!(store.load().await.expect("load"), Sequence::default());
        store.save(&sample()).await.expect("save");
        assert_eq!(store.load().await.expect("load"), sample());
    }
}
