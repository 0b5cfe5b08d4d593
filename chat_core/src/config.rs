use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::CoreError;

static DATA_DIR_NAME: &str = "chatting";
static CHAT_DB_NAME: &str = "chat_db.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

// data_dir_path
// |- chatting
//    |- chat_db.sqlite
//    |- config.json

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Any sea-orm connection url. Defaults to a SQLite file next to the config.
    pub database_url: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Fallback filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log every SQL statement.
    #[serde(default)]
    pub log_statements: bool,
}

impl ChatConfig {
    /// Creates a config whose database lives in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        let database_path = data_dir.join(CHAT_DB_NAME);

        ChatConfig {
            database_url: format!("sqlite://{}?mode=rwc", database_path.display()),
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
            log_statements: false,
        }
    }

    /// Config for a throwaway in-memory database.
    pub fn in_memory() -> Self {
        ChatConfig {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
            log_statements: false,
        }
    }
}

/// Default location of `config.json`.
pub fn default_config_path() -> Result<PathBuf, CoreError> {
    let data_dir = dirs::data_dir().ok_or(CoreError::NoDataDir)?;
    Ok(data_dir.join(DATA_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Reads the config at `config_path`, or writes a fresh one there if it
/// doesn't exist yet.
pub async fn get_or_init(config_path: &Path) -> Result<ChatConfig, CoreError> {
    let io_err = |source: std::io::Error| CoreError::ConfigIo {
        path: config_path.to_path_buf(),
        source,
    };
    let format_err = |source: serde_json::Error| CoreError::ConfigFormat {
        path: config_path.to_path_buf(),
        source,
    };

    let chat_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    fs::create_dir_all(&chat_dir).await.map_err(io_err)?;

    if fs::try_exists(config_path).await.map_err(io_err)? {
        let contents = fs::read_to_string(config_path).await.map_err(io_err)?;
        let config: ChatConfig = serde_json::from_str(&contents).map_err(format_err)?;
        Ok(config)
    } else {
        let config = ChatConfig::new(&chat_dir);

        let json = serde_json::to_string_pretty(&config).map_err(format_err)?;
        fs::write(config_path, json).await.map_err(io_err)?;
        info!(path = %config_path.display(), "wrote default config");

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("chatting-config-{name}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn creates_then_reloads_config() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join(CONFIG_FILE_NAME);
        let _ = fs::remove_dir_all(&dir).await;

        let created = get_or_init(&path).await.unwrap();
        assert!(path.exists());
        assert!(created.database_url.starts_with("sqlite://"));
        assert!(created.database_url.ends_with("chat_db.sqlite?mode=rwc"));
        assert_eq!(created.bind_addr, default_bind_addr());

        let reloaded = get_or_init(&path).await.unwrap();
        assert_eq!(created, reloaded);

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_optional_keys_take_defaults() {
        let dir = scratch_dir("defaults");
        let path = dir.join(CONFIG_FILE_NAME);
        let _ = fs::remove_dir_all(&dir).await;
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(&path, r#"{"database_url":"sqlite::memory:"}"#)
            .await
            .unwrap();

        let config = get_or_init(&path).await.unwrap();
        assert_eq!(config, ChatConfig::in_memory());

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_malformed_config() {
        let dir = scratch_dir("malformed");
        let path = dir.join(CONFIG_FILE_NAME);
        let _ = fs::remove_dir_all(&dir).await;
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(&path, "{not json").await.unwrap();

        let err = get_or_init(&path).await.unwrap_err();
        assert!(matches!(err, CoreError::ConfigFormat { .. }));

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
