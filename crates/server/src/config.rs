use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Collections served under `/:collection`; anything else is a 404
    #[serde(default = "default_collections")]
    pub collections: Vec<String>,
}

fn default_collections() -> Vec<String> {
    vec!["users".to_string(), "lists".to_string(), "items".to_string()]
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collections: default_collections(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                path: "./data/basket.db".to_string(),
            },
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;

        if let Ok(port) = std::env::var("BASKET_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("BASKET_PORT must be a port number, got {:?}", port))?;
        }

        Ok(config)
    }

    fn load_file() -> Result<Self> {
        // Try to load from environment variable
        if let Ok(path) = std::env::var("BASKET_SERVER_CONFIG") {
            return Self::load_from_path(&PathBuf::from(path));
        }

        let default_paths = vec![
            PathBuf::from("basket-server.toml"),
            PathBuf::from("config/basket-server.toml"),
        ];

        for path in default_paths {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        tracing::warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn serves(&self, collection: &str) -> bool {
        self.store.collections.iter().any(|c| c == collection)
    }
}
