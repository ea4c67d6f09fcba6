//! On-disk cluster snapshot used by the developer tool.

use crate::admin::DirectorySnapshot;
use crate::config::EngineConfig;
use crate::core::{AdminError, Result};
use crate::metadata::TablesMetadata;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub directory: DirectorySnapshot,
    #[serde(default)]
    pub tables: TablesMetadata,
}

impl ClusterSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|err| {
            AdminError::Snapshot(format!(
                "Failed to parse cluster snapshot '{}': {}",
                path.display(),
                err
            ))
        })
    }

    /// Writes the snapshot atomically: readers see either the old or the new file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(path)
            .map_err(|err| AdminError::Io(err.error.to_string()))?;
        Ok(())
    }
}
