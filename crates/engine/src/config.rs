//! Connection configuration via `datastore.toml` or the environment
//!
//! The reader and writer services of the remote datastore listen on
//! separate base URLs. Both, plus the request timeout, are configured here.

use datastore_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the reader URL
pub const ENV_READ_URL: &str = "DATASTORE_READ_URL";
/// Environment variable overriding the writer URL
pub const ENV_WRITE_URL: &str = "DATASTORE_WRITE_URL";
/// Environment variable overriding the request timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "DATASTORE_TIMEOUT_MS";

fn default_read_url() -> String {
    "http://localhost:9002/".to_string()
}

fn default_write_url() -> String {
    "http://localhost:9003/".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

/// Datastore connection settings
///
/// # Example
///
/// ```toml
/// read_url = "http://localhost:9002/"
/// write_url = "http://localhost:9003/"
/// timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// Base URL of the reader service
    #[serde(default = "default_read_url")]
    pub read_url: String,
    /// Base URL of the writer service
    #[serde(default = "default_write_url")]
    pub write_url: String,
    /// Request timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            read_url: default_read_url(),
            write_url: default_write_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl DatastoreConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check that both URLs are HTTP(S) URLs and the timeout is non-zero
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("read_url", &self.read_url), ("write_url", &self.write_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must start with http:// or https://, got '{}'",
                    name, url
                )));
            }
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Datastore connection configuration
#
# Base URL of the reader service (get, get_many, filter, ...)
read_url = "http://localhost:9002/"

# Base URL of the writer service (write, reserve_ids)
write_url = "http://localhost:9003/"

# Request timeout in milliseconds. A request that does not complete in
# time fails as "datastore unavailable".
timeout_ms = 5000
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or is invalid.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DatastoreConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
            other => other,
        })
    }

    /// Build config from the environment, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = DatastoreConfig::default();
        if let Some(url) = lookup(ENV_READ_URL) {
            config.read_url = url;
        }
        if let Some(url) = lookup(ENV_WRITE_URL) {
            config.write_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be an integer, got '{}'", ENV_TIMEOUT_MS, raw))
            })?;
        }
        config.validate()?;
        Ok(config)
    }
}
