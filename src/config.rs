use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::session::DEFAULT_TARGET_CORRECT;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub target_correct: u32,
    pub feedback_delay_ms: u64,
    pub finish_delay_ms: u64,
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_correct: DEFAULT_TARGET_CORRECT,
            feedback_delay_ms: 1500,
            finish_delay_ms: 1000,
            db_path: None,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("mulquiz_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
