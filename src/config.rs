//! Process settings.
//!
//! Read from an optional TOML file (`macrodb.toml` unless another path is
//! given) and overridden by `MACRODB_*` environment variables:
//!
//! ```toml
//! database = "macrodb.db"   # or ":memory:"
//! host = "0.0.0.0"
//! port = 5000
//! api_token = "secret"
//! log = "macrodb=debug,info"
//! ```

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::persist::PersistenceMode;

pub const DEFAULT_FILE: &str = "macrodb.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: String,
    pub host: String,
    pub port: u16,
    /// Token required by write endpoints; with none set, writes are refused.
    pub api_token: Option<String>,
    pub log: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: ":memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            api_token: None,
            log: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_FILE)).required(path.is_some()))
            .add_source(Environment::with_prefix("MACRODB").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
    pub fn persistence_mode(&self) -> PersistenceMode {
        PersistenceMode::from_setting(&self.database)
    }
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
