//! Signal and result persistence.
//!
//! A [`SignalStore`] is a directory of schema-versioned JSON artifacts keyed
//! by name: labelled signal-batch sets (so a sweep's realized signals can be
//! re-measured later without regenerating them) and result tensors. Loaded
//! batch sets are interchangeable with freshly generated ones at the
//! measurement stage.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use simlab_core::{BatchLabel, SignalBatch};

use crate::result::{ResultTensor, SCHEMA_VERSION};

#[derive(Serialize, Deserialize)]
struct StoredSignals {
    schema_version: u32,
    name: String,
    batches: Vec<(BatchLabel, SignalBatch)>,
}

/// Directory-backed store for sweep artifacts.
#[derive(Debug, Clone)]
pub struct SignalStore {
    dir: PathBuf,
}

impl SignalStore {
    /// Open a store, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).context("failed to create store directory")?;
        Ok(Self { dir })
    }

    /// Persist one labelled batch set under `name`.
    pub fn save_signals(&self, name: &str, batches: &[(BatchLabel, SignalBatch)]) -> Result<()> {
        let stored = StoredSignals {
            schema_version: SCHEMA_VERSION,
            name: name.to_string(),
            batches: batches.to_vec(),
        };
        let json = serde_json::to_string(&stored).context("failed to serialize signal batches")?;
        std::fs::write(self.signals_path(name), json).context("failed to write signal batches")
    }

    /// Load a labelled batch set previously saved under `name`.
    pub fn load_signals(&self, name: &str) -> Result<Vec<(BatchLabel, SignalBatch)>> {
        let path = self.signals_path(name);
        if !path.exists() {
            bail!("no stored signals named '{name}'");
        }
        let json = std::fs::read_to_string(&path).context("failed to read signal batches")?;
        let stored: StoredSignals =
            serde_json::from_str(&json).context("failed to deserialize signal batches")?;
        if stored.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                stored.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(stored.batches)
    }

    /// Persist one result tensor under `name`.
    pub fn save_tensor(&self, name: &str, tensor: &ResultTensor) -> Result<()> {
        let json =
            serde_json::to_string_pretty(tensor).context("failed to serialize result tensor")?;
        std::fs::write(self.tensor_path(name), json).context("failed to write result tensor")
    }

    /// Load a result tensor previously saved under `name`.
    pub fn load_tensor(&self, name: &str) -> Result<ResultTensor> {
        let path = self.tensor_path(name);
        if !path.exists() {
            bail!("no stored tensor named '{name}'");
        }
        let json = std::fs::read_to_string(&path).context("failed to read result tensor")?;
        let tensor: ResultTensor =
            serde_json::from_str(&json).context("failed to deserialize result tensor")?;
        if tensor.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                tensor.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(tensor)
    }

    pub fn contains_signals(&self, name: &str) -> bool {
        self.signals_path(name).exists()
    }

    pub fn contains_tensor(&self, name: &str) -> bool {
        self.tensor_path(name).exists()
    }

    /// Remove both artifacts stored under `name`, if present.
    pub fn remove(&self, name: &str) -> Result<()> {
        for path in [self.signals_path(name), self.tensor_path(name)] {
            if path.exists() {
                std::fs::remove_file(path).context("failed to remove stored artifact")?;
            }
        }
        Ok(())
    }

    /// Remove every artifact in the store.
    pub fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> Result<usize> {
        let count = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().is_file()
                    && entry.path().extension().and_then(|s| s.to_str()) == Some("json")
            })
            .count();
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn signals_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.signals.json"))
    }

    fn tensor_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.tensor.json"))
    }
}
