use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const API_URL_ENV: &str = "BASKET_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Where the session and cached list metadata live
    pub data_dir: Option<String>,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "basket", "basket")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = project_dirs()?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Flag, then `BASKET_API_URL`, then the config file, then localhost
    pub fn resolve_api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| std::env::var(API_URL_ENV).ok().filter(|url| !url.is_empty()))
            .or_else(|| self.remote.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.local.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_file() {
        let config = Config {
            remote: RemoteConfig {
                api_url: Some("http://from-file:3000".to_string()),
            },
            ..Config::default()
        };
        assert_eq!(
            config.resolve_api_url(Some("http://from-flag:3000".to_string())),
            "http://from-flag:3000"
        );
    }

    #[test]
    fn parses_partial_files() {
        let config: Config = toml::from_str(
            r#"
            [local]
            data_dir = "/tmp/basket"
            "#,
        )
        .unwrap();
        assert_eq!(config.remote.api_url, None);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/basket"));
    }
}
