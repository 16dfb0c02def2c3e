//! Runtime configuration for registry hosts.
//!
//! # Responsibility
//! - Collect storage, logging and paging settings in one value.
//! - Provide defaults that match the platform's existing behaviour.
//!
//! # Invariants
//! - `default_page_size` never exceeds `max_page_size` after `validate()`.

use crate::logging::default_log_level;
use crate::repo::app_repo::DeletedAppIdPolicy;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 500;

/// Settings used to open the store and build the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// SQLite file path. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub deleted_app_id_policy: DeletedAppIdPolicy,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            deleted_app_id_policy: DeletedAppIdPolicy::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl RegistryConfig {
    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_page_size == 0 {
            return Err("max_page_size must be greater than zero".to_string());
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(format!(
                "default_page_size must be within 1..={}, got {}",
                self.max_page_size, self.default_page_size
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{RegistryConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
    use crate::repo::app_repo::DeletedAppIdPolicy;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
        assert_eq!(config.deleted_app_id_policy, DeletedAppIdPolicy::Reusable);
    }

    #[test]
    fn rejects_default_page_size_above_max() {
        let config = RegistryConfig {
            default_page_size: 50,
            max_page_size: 10,
            ..RegistryConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("default_page_size"));
    }

    #[test]
    fn rejects_relative_log_dir() {
        let config = RegistryConfig {
            log_dir: Some(PathBuf::from("logs/dev")),
            ..RegistryConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("absolute"));
    }

    #[test]
    fn deserializes_partial_settings() {
        let config: RegistryConfig = serde_json::from_str(
            r#"{"deleted_app_id_policy":"reserved","default_page_size":5}"#,
        )
        .unwrap();
        assert_eq!(config.deleted_app_id_policy, DeletedAppIdPolicy::Reserved);
        assert_eq!(config.default_page_size, 5);
        assert_eq!(config.max_page_size, MAX_PAGE_SIZE);
    }
}
