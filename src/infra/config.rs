use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TABLE: &str = "records";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
    #[error("Invalid MODE: {0}. Must be 'server' or 'stdio'")]
    Mode(String),
    #[error("PORT cannot be 0")]
    Port,
}

/// File layer, every field optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    query: QuerySection,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    mode: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct QuerySection {
    database_url: Option<String>,
    table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub database_url: Option<String>,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mode: String, // "server" or "stdio"
    pub port: u16,
    pub query: QueryConfig,
}

impl AppConfig {
    /// Environment only.
    pub fn from_env() -> Self {
        Self::merge(FileConfig::default())
    }

    /// TOML file named by `GATEWAY_CONFIG` (if any), overridden by environment.
    pub fn from_env_and_toml() -> Result<Self, ConfigError> {
        let file = match std::env::var("GATEWAY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?
            }
            _ => FileConfig::default(),
        };
        Ok(Self::merge(file))
    }

    fn merge(file: FileConfig) -> Self {
        let mode = std::env::var("MODE")
            .ok()
            .or(file.server.mode)
            .unwrap_or_else(|| "server".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .or(file.server.port)
            .unwrap_or(DEFAULT_PORT);
        let database_url = std::env::var("QUERY_DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or(file.query.database_url);
        let table = std::env::var("QUERY_TABLE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or(file.query.table)
            .unwrap_or_else(|| DEFAULT_TABLE.into());

        Self { mode, port, query: QueryConfig { database_url, table } }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            return Err(ConfigError::Mode(self.mode.clone()));
        }
        if self.mode == "server" && self.port == 0 {
            return Err(ConfigError::Port);
        }
        Ok(())
    }
}
