use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub const CONFIG_ENV: &str = "PORTFOLIO_CONFIG";
pub const DATA_DIR_ENV: &str = "PORTFOLIO_DATA_DIR";

/// Where the flat files live.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub users_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            users_file: "username.csv".to_string(),
        }
    }
}

impl Config {
    /// Read a JSON config file; missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json_data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json_data)?)
    }

    /// Defaults, then the file named by `PORTFOLIO_CONFIG`, then
    /// `PORTFOLIO_DATA_DIR`.
    pub fn from_env() -> Result<Self, StoreError> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(dir) = env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    pub fn portfolio_path(&self, username: &str) -> PathBuf {
        self.data_dir.join(format!("{}_portfolio.csv", username))
    }

    pub fn journal_path(&self, username: &str) -> PathBuf {
        self.data_dir.join(format!("{}_transaction_history.csv", username))
    }
}
