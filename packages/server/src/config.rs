use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use quire_common::StorageAppConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublicationConfig {
    /// Directory holding the plaintext master files publications are built from.
    #[serde(default = "default_master_repository")]
    pub master_repository: PathBuf,
}

fn default_master_repository() -> PathBuf {
    PathBuf::from("./data/master")
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            master_repository: default_master_repository(),
        }
    }
}

/// External encryption tool invocation.
#[derive(Debug, Deserialize, Clone)]
pub struct EncryptionConfig {
    #[serde(default = "default_encryption_program")]
    pub program: String,
    /// Extra arguments placed before the source/output/disposition triple.
    #[serde(default)]
    pub args: Vec<String>,
    /// Where encrypted outputs are written. Defaults to the system temp dir.
    #[serde(default = "std::env::temp_dir")]
    pub work_dir: PathBuf,
}

fn default_encryption_program() -> String {
    "quire-encrypt".into()
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            program: default_encryption_program(),
            args: Vec::new(),
            work_dir: std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageAppConfig,
    #[serde(default)]
    pub publication: PublicationConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("QUIRE_CONFIG").unwrap_or_else(|_| "config/config".into());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml unless QUIRE_CONFIG points elsewhere
            .add_source(File::with_name(&path).required(false))
            // Override from environment (e.g., QUIRE__DATABASE__URL)
            .add_source(
                Environment::with_prefix("QUIRE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .with_list_parse_key("encryption.args")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
