//! CLI command implementations.

mod display;

pub mod audit;
pub mod hierarchy;
pub mod impact;
pub mod init;
pub mod tree;

use std::path::{Path, PathBuf};

use strata::config::{CONFIG_FILE_NAME, STRATA_DIR_NAME};
use strata::{Error, Result, Strata, StrataConfig};

/// Resolved configuration shared by every command.
pub struct Context {
    pub config_path: PathBuf,
    pub config: StrataConfig,
}

impl Context {
    /// Load the configuration file (defaults when absent) and apply `--db`.
    pub fn load(config_path: Option<PathBuf>, db: Option<PathBuf>) -> Result<Self> {
        let explicit = config_path.is_some();
        let config_path =
            config_path.unwrap_or_else(|| Path::new(STRATA_DIR_NAME).join(CONFIG_FILE_NAME));

        let mut config = if explicit {
            StrataConfig::load(&config_path)?
        } else {
            StrataConfig::load_or_default(&config_path)?
        };
        if let Some(db) = db {
            config.database = db;
        }

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Open the configured database, which must already exist.
    pub fn open(&self) -> Result<Strata> {
        if !self.config.database.exists() {
            return Err(Error::Config(format!(
                "no database at '{}'; run `strata init` first",
                self.config.database.display()
            )));
        }
        Strata::open(self.config.clone())
    }
}
