use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use tracing::warn;

use crate::autosave::{AutosaveConfig, DEFAULT_SAVED_DISPLAY, DEFAULT_SAVE_DELAY};

pub const DATA_DIR_VAR: &str = "ROSARIUM_DATA_DIR";
pub const SAVE_DELAY_VAR: &str = "ROSARIUM_SAVE_DELAY_MS";
pub const SAVED_DISPLAY_VAR: &str = "ROSARIUM_SAVED_DISPLAY_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub autosave: AutosaveConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let autosave = AutosaveConfig {
            delay: millis(&lookup, SAVE_DELAY_VAR).unwrap_or(DEFAULT_SAVE_DELAY),
            saved_display: millis(&lookup, SAVED_DISPLAY_VAR).unwrap_or(DEFAULT_SAVED_DISPLAY),
        };
        Self { data_dir, autosave }
    }

    /// A `--data-dir` flag wins over the environment.
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.data_dir = dir;
        }
        self
    }
}

pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "rosarium")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".rosarium"))
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!(%key, value = %raw, "ignoring non-numeric setting");
            None
        }
    }
}
