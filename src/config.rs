//! Service configuration, loaded from camelCase JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sqlx_sqlite_conn_mgr::SqliteDatabaseConfig;

use crate::{Error, Result};

/// Page size used when a request carries no usable `limit`.
pub const DEFAULT_PAGINATION_LIMIT: i64 = 100;

/// Paged query configuration.
///
/// Every field is optional in the JSON document:
///
/// ```json
/// {
///   "databasePath": "data/app.db",
///   "defaultPaginationLimit": 50,
///   "maxReadConnections": 4,
///   "idleTimeoutSecs": 30,
///   "busyTimeoutSecs": 5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
   pub database_path: PathBuf,
   pub default_pagination_limit: i64,
   pub max_read_connections: u32,
   pub idle_timeout_secs: u64,
   pub busy_timeout_secs: u64,
}

impl Default for Config {
   fn default() -> Self {
      let pool = SqliteDatabaseConfig::default();
      Self {
         database_path: PathBuf::from("data.db"),
         default_pagination_limit: DEFAULT_PAGINATION_LIMIT,
         max_read_connections: pool.max_read_connections,
         idle_timeout_secs: pool.idle_timeout.as_secs(),
         busy_timeout_secs: pool.busy_timeout.as_secs(),
      }
   }
}

impl Config {
   /// Parse and validate a JSON configuration document.
   pub fn from_json_str(json: &str) -> Result<Self> {
      let config: Config = serde_json::from_str(json)?;
      config.validate()?;
      Ok(config)
   }

   /// Read and validate a JSON configuration file.
   pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
      let json = tokio::fs::read_to_string(path).await?;
      Self::from_json_str(&json)
   }

   fn validate(&self) -> Result<()> {
      if self.default_pagination_limit <= 0 {
         return Err(Error::Config(format!(
            "defaultPaginationLimit must be positive, got {}",
            self.default_pagination_limit
         )));
      }
      if self.max_read_connections == 0 {
         return Err(Error::Config(
            "maxReadConnections must be at least 1".to_string(),
         ));
      }
      Ok(())
   }

   /// Pool settings for the connection manager.
   pub fn database_config(&self) -> SqliteDatabaseConfig {
      SqliteDatabaseConfig {
         max_read_connections: self.max_read_connections,
         idle_timeout: Duration::from_secs(self.idle_timeout_secs),
         busy_timeout: Duration::from_secs(self.busy_timeout_secs),
      }
   }
}
