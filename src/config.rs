use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// WebSocket endpoint of the relay server.
    pub server_url: String,
    pub username: String,
    /// Address the relay server binds in `server` mode.
    pub listen_addr: String,
    pub audit_db_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080/ws".to_string(),
            username: "anonymous".to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            audit_db_path: "data/audit.db".to_string(),
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    crate::storage::ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("socket_chat-{}", uuid::Uuid::new_v4()))
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(&scratch_path("absent.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = scratch_path("partial.json");
        crate::storage::ensure_parent_dir(&path).unwrap();
        fs::write(&path, r#"{"username": "ann"}"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.username, "ann");
        assert_eq!(config.server_url, AppConfig::default().server_url);
    }

    #[test]
    fn unparsable_file_yields_defaults() {
        let path = scratch_path("broken.json");
        crate::storage::ensure_parent_dir(&path).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_config(&path), AppConfig::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let path = scratch_path("nested/chat.json");
        let config = AppConfig {
            server_url: "ws://chat.example:9000/ws".to_string(),
            username: "bob".to_string(),
            ..AppConfig::default()
        };

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }
}
