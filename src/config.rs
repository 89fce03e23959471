use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::draw::PriorityFilter;
use crate::engine::syllabus::DEFAULT_SYLLABUS;
use crate::store::json_store::default_data_dir;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_syllabus")]
    pub syllabus: String,
    #[serde(default)]
    pub combined_filter: PriorityFilter,
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_syllabus() -> String {
    DEFAULT_SYLLABUS.to_string()
}
fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            syllabus: default_syllabus(),
            combined_filter: PriorityFilter::default(),
            data_dir: default_data_dir_string(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studydraw")
            .join("config.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Resets `syllabus` to the default when it names nothing known.
    pub fn normalize_syllabus(&mut self, valid_names: &[String]) {
        if !valid_names.iter().any(|n| *n == self.syllabus) {
            self.syllabus = default_syllabus();
        }
    }
}
