//! Cross-platform application paths

use std::fs;
use std::path::PathBuf;

use crate::DaemonError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, DaemonError> {
        let base = dirs::data_dir().ok_or(DaemonError::DataDir)?;
        let data_dir = base.join("vortex");

        // Ensure directory exists
        fs::create_dir_all(&data_dir)?;

        Ok(Self { data_dir })
    }

    #[allow(dead_code)]
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn engine_file(&self) -> PathBuf {
        self.data_dir.join("engine.vxi")
    }
}
