use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub static CONFIG: OnceCell<Config> = OnceCell::new();

const ENV_PREFIX: &str = "DELIVERYDESK_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub deliverydesk: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const DELIVERYDESK_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            deliverydesk: Self::DELIVERYDESK_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.deliverydesk.clone();
        self.deliverydesk = self.deliverydesk.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.deliverydesk.as_str()) {
            eprintln!(
                "Config error: deliverydesk log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::DELIVERYDESK_LEVEL
            );
            self.deliverydesk = Self::DELIVERYDESK_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const HOST: &str = "127.0.0.1";
    const PORT: u16 = 8080;

    fn default() -> Self {
        ServerConfig {
            host: Self::HOST.to_owned(),
            port: Self::PORT,
        }
    }

    fn ensure_valid(&mut self) {
        self.host = self.host.trim().to_owned();
        if self.host.is_empty() {
            eprintln!(
                "Config error: server host is empty - using default of '{}'",
                Self::HOST
            );
            self.host = Self::HOST.to_owned();
        }

        if self.port == 0 {
            eprintln!(
                "Config error: server port of 0 is invalid - using default of '{}'",
                Self::PORT
            );
            self.port = Self::PORT;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Directory holding the database file. Falls back to the data directory when unset.
    pub dir: Option<String>,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
}

impl DatabaseConfig {
    const POOL_SIZE: u32 = 8;
    const CONNECTION_TIMEOUT_SECS: u64 = 30;

    fn default() -> Self {
        DatabaseConfig {
            dir: None,
            pool_size: Self::POOL_SIZE,
            connection_timeout_secs: Self::CONNECTION_TIMEOUT_SECS,
        }
    }

    fn ensure_valid(&mut self) {
        if self.pool_size == 0 {
            eprintln!(
                "Config error: database pool_size of 0 is invalid - using default of '{}'",
                Self::POOL_SIZE
            );
            self.pool_size = Self::POOL_SIZE;
        }

        if self.connection_timeout_secs == 0 {
            eprintln!(
                "Config error: database connection_timeout_secs of 0 is invalid - using default of '{}'",
                Self::CONNECTION_TIMEOUT_SECS
            );
            self.connection_timeout_secs = Self::CONNECTION_TIMEOUT_SECS;
        }

        if matches!(self.dir.as_deref().map(str::trim), Some("")) {
            self.dir = None;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

impl Config {
    fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
        }
    }

    /// Loads the configuration from a TOML file located in the app's data directory,
    /// layered under `DELIVERYDESK_` environment variables.
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");

        if !config_path.exists() {
            Self::write_default(&config_path);
        }

        Self::load_from(&config_path).unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            let mut config = Self::default();
            config.ensure_valid();
            config
        })
    }

    /// Builds the layered configuration for the given file without touching the disk.
    pub fn load_from(config_path: &Path) -> Result<Self, AppError> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Config = figment.extract().map_err(Box::new)?;
        config.ensure_valid();

        Ok(config)
    }

    fn write_default(config_path: &Path) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }

        match toml::to_string_pretty(&Self::default()) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.server.ensure_valid();
        self.database.ensure_valid();
    }

    /// Directory where the database file lives: the configured one, or the app data directory.
    pub fn database_dir(&self, project_dirs: &ProjectDirs) -> PathBuf {
        match &self.database.dir {
            Some(dir) => PathBuf::from(dir),
            None => project_dirs.data_local_dir().to_path_buf(),
        }
    }

    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::default)
    }

    pub fn get_server_host() -> String {
        Self::get().server.host.clone()
    }

    pub fn get_server_port() -> u16 {
        Self::get().server.port
    }
}
