// Built model persistence
use anyhow::{anyhow, bail, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use pathwise_core::CareerModel;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Bumped whenever the serialized model layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk wrapper around the bincode-encoded model
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    version: u32,
    created_at: DateTime<Utc>,
    /// Hex SHA-256 of `payload`
    checksum: String,
    payload: Vec<u8>,
}

/// Description of a saved artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub size: u64,
    pub checksum: String,
    pub clusters: usize,
}

/// Saves and loads a [`CareerModel`] at a fixed path.
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the model atomically, replacing any previous artifact.
    pub fn save(&self, model: &CareerModel) -> Result<ArtifactInfo> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let payload = bincode::serialize(model).map_err(|e| anyhow!("Serialization error: {}", e))?;
        let envelope = ArtifactEnvelope {
            version: FORMAT_VERSION,
            created_at: Utc::now(),
            checksum: checksum(&payload),
            payload,
        };
        let data = bincode::serialize(&envelope).map_err(|e| anyhow!("Serialization error: {}", e))?;

        AtomicFile::new(&self.path, AllowOverwrite)
            .write(|f| f.write_all(&data))
            .with_context(|| format!("Failed to write artifact {:?}", self.path))?;

        tracing::info!(path = ?self.path, bytes = data.len(), clusters = model.n_clusters(), "saved model artifact");
        Ok(ArtifactInfo {
            path: self.path.clone(),
            version: envelope.version,
            created_at: envelope.created_at,
            size: data.len() as u64,
            checksum: envelope.checksum,
            clusters: model.n_clusters(),
        })
    }

    /// Read and verify the model.
    pub fn load(&self) -> Result<CareerModel> {
        let data = std::fs::read(&self.path).with_context(|| format!("Failed to read artifact {:?}", self.path))?;
        let envelope: ArtifactEnvelope =
            bincode::deserialize(&data).map_err(|e| anyhow!("Corrupt artifact {:?}: {}", self.path, e))?;

        if envelope.version != FORMAT_VERSION {
            bail!(
                "Unsupported artifact version {} in {:?} (expected {})",
                envelope.version,
                self.path,
                FORMAT_VERSION
            );
        }
        let actual = checksum(&envelope.payload);
        if actual != envelope.checksum {
            bail!("Checksum mismatch: expected {}, got {}", envelope.checksum, actual);
        }

        let model: CareerModel = bincode::deserialize(&envelope.payload)
            .map_err(|e| anyhow!("Corrupt model payload in {:?}: {}", self.path, e))?;
        tracing::info!(
            path = ?self.path,
            created_at = %envelope.created_at.format("%Y-%m-%dT%H:%M:%SZ"),
            clusters = model.n_clusters(),
            "loaded model artifact"
        );
        Ok(model)
    }
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathwise_core::{BuildConfig, Catalog, ItemRecord, ModelBuilder};
    use pathwise_schema::{CategoricalMapping, MappingRow};
    use tempfile::TempDir;

    fn model() -> CareerModel {
        let records = (0..6u64)
            .map(|i| {
                ItemRecord::new(i, format!("Job {i}"), "General")
                    .with_attribute("salary_inr_avg", 100_000.0 * (i + 1) as f64)
                    .with_attribute("stress_level", (i % 3) as f64)
                    .with_attribute("remote_work_feasibility", "Hybrid")
            })
            .collect();
        let mappings = CategoricalMapping::from_rows(vec![MappingRow::new("stream", "Science", "2")]);
        ModelBuilder::new(BuildConfig::default())
            .build(Catalog::from_records(records).unwrap(), mappings)
            .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("models/career.bin"));
        let model = model();

        let info = store.save(&model).unwrap();
        assert!(store.exists());
        assert_eq!(info.version, FORMAT_VERSION);
        assert_eq!(info.clusters, model.n_clusters());
        assert_eq!(info.checksum.len(), 64);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, model);
        for item in model.catalog.items() {
            assert_eq!(loaded.catalog.get(item.id), Some(item));
        }
    }

    #[test]
    fn test_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("career.bin"));
        store.save(&model()).unwrap();
        store.save(&model()).unwrap();
        assert!(store.load().is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("career.bin"));
        store.save(&model()).unwrap();

        let mut data = std::fs::read(store.path()).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        std::fs::write(store.path(), &data).unwrap();

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_garbage_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("career.bin"));
        std::fs::write(store.path(), b"not a model").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(ArtifactStore::new(dir.path().join("none.bin")).load().is_err());
    }
}
