//! YAML configuration for strata.
//!
//! Every field is optional. An absent file and an empty file both yield the
//! defaults, which reproduce the built-in risk thresholds.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::risk::RiskTables;

/// Name of the strata directory
pub const STRATA_DIR_NAME: &str = ".strata";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "strata.yaml";

/// Name of the SQLite database file
pub const DATABASE_FILE_NAME: &str = "strata.db";

/// Configuration file structure for strata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StrataConfig {
    /// Path to the SQLite database
    pub database: PathBuf,

    /// Risk threshold tables, one per analysis kind
    pub risk: RiskTables,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            database: Path::new(STRATA_DIR_NAME).join(DATABASE_FILE_NAME),
            risk: RiskTables::default(),
        }
    }
}

impl StrataConfig {
    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the text is not valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// `Error::Io` if the file cannot be read, `Error::Config` if it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load `path` if it exists, the defaults otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`StrataConfig::load`] when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// `Error::Config` if serialization fails, `Error::Io` if the write does.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{Metric, RiskCounts, RiskLevel};
    use tempfile::TempDir;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(StrataConfig::from_yaml("").expect("parse"), StrataConfig::default());
        assert_eq!(
            StrataConfig::default().database,
            PathBuf::from(".strata/strata.db")
        );
    }

    #[test]
    fn partial_risk_override_keeps_other_tables() {
        let yaml = r"
database: /tmp/inventory.db
risk:
  multi_interface:
    baseline: low
    bands:
      - level: high
        limits:
          change_requests: 0
";
        let config = StrataConfig::from_yaml(yaml).expect("parse");

        assert_eq!(config.database, PathBuf::from("/tmp/inventory.db"));
        let one_cr = RiskCounts {
            change_requests: 1,
            ..RiskCounts::default()
        };
        assert_eq!(config.risk.multi_interface.classify(&one_cr), RiskLevel::High);
        assert_eq!(config.risk.application, RiskTables::default().application);
        assert!(
            config.risk.multi_interface.bands[0]
                .limits
                .contains_key(&Metric::ChangeRequests)
        );
    }

    #[test]
    fn invalid_yaml_is_config_error() {
        let err = StrataConfig::from_yaml("risk: [not, a, table]").expect_err("invalid");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(STRATA_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = StrataConfig {
            database: temp.path().join("db.sqlite"),
            ..StrataConfig::default()
        };

        config.save(&path).expect("save");

        assert_eq!(StrataConfig::load(&path).expect("load"), config);
        assert_eq!(
            StrataConfig::load_or_default(&temp.path().join("missing.yaml")).expect("default"),
            StrataConfig::default()
        );
    }
}
