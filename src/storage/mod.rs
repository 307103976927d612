//! Storage Layer
//!
//! Platform directories for configuration and data, plus an on-disk store
//! for uploaded capture images.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "scentscan", "ScentScan")
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let proj_dirs =
        project_dirs().ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

    let data_dir = proj_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs =
        project_dirs().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Default location for saved captures
pub fn default_uploads_dir() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("uploads"))
}

/// Writes uploaded images to a directory under unique names
#[derive(Debug, Clone)]
pub struct CaptureStore {
    dir: PathBuf,
}

impl CaptureStore {
    /// Open (creating if needed) a capture directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create uploads directory {:?}", dir))?;
        Ok(Self { dir })
    }

    /// Capture directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save image bytes as `capture-<uuid>.png`
    pub async fn save(&self, image: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(format!("capture-{}.png", Uuid::new_v4()));
        tokio::fs::write(&path, image)
            .await
            .with_context(|| format!("Failed to write capture {:?}", path))?;
        debug!("Saved capture to {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_capture_store_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("uploads");

        let store = CaptureStore::new(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[tokio::test]
    async fn test_capture_store_saves_unique_files() {
        let temp = TempDir::new().unwrap();
        let store = CaptureStore::new(temp.path()).unwrap();

        let first = store.save(b"first").await.unwrap();
        let second = store.save(b"second").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");

        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("capture-"));
        assert!(name.ends_with(".png"));
    }
}
