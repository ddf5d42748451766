use std::path::{Path, PathBuf};

use iroh::SecretKey;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::ConfigError;

static DATA_DIR_NAME: &str = "threadly";
static THREADLY_DB_NAME: &str = "threadly_db.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

// data_dir_path
// |- threadly
//    |- threadly_db.sqlite
//    |- config.json

fn default_secret_key() -> SecretKey {
    SecretKey::generate(&mut rand::rng())
}

fn default_page_limit() -> u64 {
    10
}

fn default_max_page_limit() -> u64 {
    50
}

/// Tunables for the comment core.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommentsConfig {
    /// Page size used when a request carries no usable limit.
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u64,

    /// Upper bound a requested page size is clamped to.
    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: u64,

    /// Deepest reply allowed. `None` leaves nesting unbounded.
    #[serde(default)]
    pub max_reply_depth: Option<u32>,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            default_page_limit: default_page_limit(),
            max_page_limit: default_max_page_limit(),
            max_reply_depth: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ThreadlyConfig {
    /// Secret key for the local node.
    #[serde(default = "default_secret_key")]
    pub(crate) secret_key: SecretKey,

    /// Secret key for the local client endpoint.
    #[serde(default = "default_secret_key")]
    pub(crate) client_secret_key: SecretKey,

    pub(crate) database_path: PathBuf,

    #[serde(default)]
    pub comments: CommentsConfig,
}

impl ThreadlyConfig {
    fn new(data_dir: &Path) -> Self {
        ThreadlyConfig {
            secret_key: default_secret_key(),
            client_secret_key: default_secret_key(),
            database_path: data_dir.join(THREADLY_DB_NAME),
            comments: CommentsConfig::default(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

/// Gets the existing config or initializes a new one in the platform data dir.
pub async fn get_or_init() -> Result<ThreadlyConfig, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    load_or_create(&data_dir.join(DATA_DIR_NAME)).await
}

/// Reads `config.json` from `dir`, writing a fresh one when absent.
pub async fn load_or_create(dir: &Path) -> Result<ThreadlyConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(dir).await?;

    if fs::try_exists(&config_path).await? {
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        Ok(serde_json::from_str(&contents)?)
    } else {
        let config = ThreadlyConfig::new(dir);

        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("threadly-config-{name}-{}", uuid::Uuid::now_v7()))
    }

    #[test]
    fn test_comments_config_defaults_when_fields_missing() {
        let config: CommentsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CommentsConfig::default());
        assert_eq!(config.default_page_limit, 10);
        assert_eq!(config.max_page_limit, 50);
        assert_eq!(config.max_reply_depth, None);
    }

    #[tokio::test]
    async fn test_load_or_create_persists_config() {
        let dir = scratch_dir("persist");

        let created = load_or_create(&dir).await.unwrap();
        assert!(dir.join(CONFIG_FILE_NAME).exists());
        assert_eq!(created.database_path, dir.join(THREADLY_DB_NAME));

        let loaded = load_or_create(&dir).await.unwrap();
        assert_eq!(loaded.database_path, created.database_path);
        assert_eq!(loaded.secret_key.public(), created.secret_key.public());
        assert_eq!(loaded.comments, created.comments);

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_config_is_an_error() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join(CONFIG_FILE_NAME), b"{ not json").await.unwrap();

        let result = load_or_create(&dir).await;
        assert!(matches!(result, Err(ConfigError::Json(_))));

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
