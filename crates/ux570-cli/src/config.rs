use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use ux570_core::{device, ImportMode};

/// User configuration. Everything has a default, so a missing file or a
/// partial file both work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Linux username owning the mounts under /media. Empty = $USER.
    pub username: String,
    /// Volume label of the recorder's card.
    pub card_name: String,
    pub default_output_dir: String,
    pub default_mode: ImportMode,
    pub excluded_folders: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            card_name: "DVR_SD".to_string(),
            default_output_dir: "~/DVR-Recordings".to_string(),
            default_mode: ImportMode::Copy,
            excluded_folders: vec!["RADIO01".to_string()],
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("malformed config {}", path.display()))
    }

    fn username(&self) -> String {
        if self.username.is_empty() {
            env::var("USER").unwrap_or_else(|_| "root".to_string())
        } else {
            self.username.clone()
        }
    }

    /// Where the OS mounts this user's removable volumes.
    pub fn media_root(&self) -> PathBuf {
        PathBuf::from("/media").join(self.username())
    }

    /// Config-derived recordings root, used when auto-detection finds
    /// nothing.
    pub fn source_root(&self) -> PathBuf {
        device::recordings_root(&self.media_root().join(&self.card_name))
    }

    pub fn output_dir(&self) -> PathBuf {
        expand_tilde(&self.default_output_dir)
    }
}

pub fn default_config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("ux570-import").join("config.json");
    }
    home_dir().join(".config").join("ux570-import").join("config.json")
}

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| "/".to_string()))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        home_dir()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("config.json"))).unwrap();
        assert_eq!(config.card_name, "DVR_SD");
        assert_eq!(config.default_mode, ImportMode::Copy);
        assert_eq!(config.excluded_folders, vec!["RADIO01".to_string()]);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::File::create(&path)
            .unwrap()
            .write_all(br#"{"username": "alice", "default_mode": "move"}"#)
            .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.default_mode, ImportMode::Move);
        assert_eq!(config.card_name, "DVR_SD");
        assert_eq!(config.media_root(), PathBuf::from("/media/alice"));
        assert_eq!(
            config.source_root(),
            PathBuf::from("/media/alice/DVR_SD/PRIVATE/SONY/REC_FILE")
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "card_name: DVR_SD").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_expand_tilde() {
        env::set_var("HOME", "/home/alice");
        assert_eq!(
            expand_tilde("~/DVR-Recordings"),
            PathBuf::from("/home/alice/DVR-Recordings")
        );
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
