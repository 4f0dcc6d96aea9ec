//! Catalog configuration
//!
//! Settings are read from the environment with [`CatalogConfig::from_env`].
//! Unset variables fall back to their defaults; unparseable values and
//! combinations rejected by [`CatalogConfig::validate`] are errors.
//!
//! | variable                     | default     |
//! |------------------------------|-------------|
//! | `CATALOG_DEFAULT_PAGE_SIZE`  | `20`        |
//! | `CATALOG_MAX_PAGE_SIZE`      | `100`       |
//! | `CATALOG_FORK_TITLE_SUFFIX`  | `" (Fork)"` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Suffix appended to a forked version's title.
pub const DEFAULT_FORK_TITLE_SUFFIX: &str = " (Fork)";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting has an unusable value
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Setting name
        key: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Page size used when the caller gives none
    pub default_page_size: u32,

    /// Requested page sizes are capped at this value
    pub max_page_size: u32,

    /// Appended to the title of a fork's initial version
    pub fork_title_suffix: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            fork_title_suffix: DEFAULT_FORK_TITLE_SUFFIX.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let size = |key: &'static str, default: u32| match lookup(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::InvalidValue {
                key,
                message: format!("{:?} is not a page size: {}", raw, e),
            }),
        };

        let config = Self {
            default_page_size: size("CATALOG_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: size("CATALOG_MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
            fork_title_suffix: lookup("CATALOG_FORK_TITLE_SUFFIX")
                .unwrap_or_else(|| DEFAULT_FORK_TITLE_SUFFIX.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the default page size.
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    /// Set the maximum page size.
    pub fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size;
        self
    }

    /// Set the fork title suffix.
    pub fn with_fork_title_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.fork_title_suffix = suffix.into();
        self
    }

    /// Check that the settings are usable together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "default_page_size",
                message: "must be positive".to_string(),
            });
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_page_size",
                message: "must be positive".to_string(),
            });
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue {
                key: "default_page_size",
                message: format!(
                    "{} exceeds max_page_size {}",
                    self.default_page_size, self.max_page_size
                ),
            });
        }
        Ok(())
    }
}
