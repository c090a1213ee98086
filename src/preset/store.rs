//! Preset directory store.
//!
//! One JSON file per preset under a fixed directory resolved at
//! startup; the file stem is the preset name. Writes overwrite without
//! merging or versioning. There is no locking: concurrent writers to
//! the same name race and the last write wins.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::preset::document::Preset;

/// Extension for preset files.
const PRESET_EXT: &str = "json";

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Preset name must not be empty")]
    InvalidName,

    #[error("Preset not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preset file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Filesystem store for named presets.
pub struct PresetStore {
    /// Directory holding the preset files.
    dir: PathBuf,
}

impl PresetStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is not created until the first write, so a
    /// read-only listing of a fresh installation stays side-effect free.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a named preset.
    fn preset_path(&self, name: &str) -> Result<PathBuf, PresetError> {
        if name.is_empty() {
            return Err(PresetError::InvalidName);
        }
        Ok(self.dir.join(format!("{name}.{PRESET_EXT}")))
    }

    /// List all preset names, lexicographically sorted.
    ///
    /// Returns an empty list when the directory does not exist yet.
    pub fn list(&self) -> Result<Vec<String>, PresetError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_preset = path.is_file()
                && path.extension().map(|e| e == PRESET_EXT).unwrap_or(false);
            if is_preset {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read a named preset.
    ///
    /// Missing document keys fall back to field defaults; only a file
    /// that is not JSON at all fails with [`PresetError::Parse`].
    pub fn read(&self, name: &str) -> Result<Preset, PresetError> {
        let path = self.preset_path(name)?;
        if !path.exists() {
            return Err(PresetError::NotFound(name.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let preset: Preset = serde_json::from_str(&data)?;
        debug!(name, path = %path.display(), "Preset read");
        Ok(preset)
    }

    /// Write a named preset, overwriting any existing file.
    pub fn write(&self, name: &str, preset: &Preset) -> Result<(), PresetError> {
        let path = self.preset_path(name)?;
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_string_pretty(preset)?;
        std::fs::write(&path, data)?;
        info!(name, path = %path.display(), "Preset saved");
        Ok(())
    }

    /// Delete a named preset. The removal is permanent.
    pub fn delete(&self, name: &str) -> Result<(), PresetError> {
        let path = self.preset_path(name)?;
        if !path.exists() {
            return Err(PresetError::NotFound(name.to_string()));
        }
        std::fs::remove_file(&path)?;
        info!(name, "Preset deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_absent_directory() {
        let store = PresetStore::new("/nonexistent/preset/dir");
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_empty_name_rejected_before_fs_access() {
        let store = PresetStore::new("/nonexistent/preset/dir");
        assert!(matches!(store.read(""), Err(PresetError::InvalidName)));
        assert!(matches!(store.delete(""), Err(PresetError::InvalidName)));
        assert!(matches!(
            store.write("", &Preset::default()),
            Err(PresetError::InvalidName)
        ));
    }

    #[test]
    fn test_read_missing_preset() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PresetStore::new(tmp.path());
        assert!(matches!(store.read("nope"), Err(PresetError::NotFound(_))));
    }
}
