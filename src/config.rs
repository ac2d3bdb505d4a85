use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/client.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Master volume (0 to 100) applied at session start.
    pub master_volume: f32,
    /// Scheduler tick interval in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master_volume: 100.0,
            // 20 ticks per second keeps fades smooth without busy-waiting.
            tick_interval_ms: 50,
        }
    }
}

impl ClientConfig {
    /// Load client configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ClientConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ClientConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                ClientConfig::default()
            }
        }
    }

    /// Save client configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.master_volume, 100.0);
        assert!(cfg.tick_interval_ms > 0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ClientConfig::load_from_path(Path::new("/nonexistent/client.toml"));
        assert_eq!(cfg.master_volume, 100.0);
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("client.toml");
        let cfg = ClientConfig {
            master_volume: 60.0,
            tick_interval_ms: 25,
        };
        cfg.save_to_path(&path).expect("save succeeds");

        let loaded = ClientConfig::load_from_path(&path);
        assert_eq!(loaded.master_volume, 60.0);
        assert_eq!(loaded.tick_interval_ms, 25);
    }
}
