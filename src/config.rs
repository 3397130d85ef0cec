use anyhow::Result;
use serde_derive::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use toml;

use crate::presentation::WarnMode;

pub fn parse<P: AsRef<Path>>(p: P) -> Result<Config> {
    let s = fs::read_to_string(p)?;
    let config = toml::from_str(&s)?;
    Ok(config)
}

/// Reads the configuration. A file given explicitly must parse, while a
/// missing or broken file at the default location falls back to defaults.
pub fn load(explicit: Option<&Path>, default: Option<PathBuf>) -> Result<Config> {
    match explicit {
        Some(path) => parse(path),
        None => Ok(default.and_then(|p| parse(p).ok()).unwrap_or_default()),
    }
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub history_size: usize,
    pub not_undoable_warn_mode: WarnMode,
    pub logout_warn_mode: WarnMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: false,
            history_size: 10,
            not_undoable_warn_mode: WarnMode::Dialog,
            logout_warn_mode: WarnMode::Dialog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str("history_size = 0\nlogout_warn_mode = \"continue\"").unwrap();
        assert_eq!(config.history_size, 0);
        assert_eq!(config.logout_warn_mode, WarnMode::Continue);
        assert_eq!(config.not_undoable_warn_mode, WarnMode::Dialog);
        assert!(!config.debug);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(toml::from_str::<Config>("not_undoable_warn_mode = \"maybe\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(parse("/nonexistent/navsync/config.toml").is_err());
        assert_eq!(Config::default().history_size, 10);
    }

    #[test]
    fn test_explicit_file_must_parse() {
        let path = std::env::temp_dir().join("navsync-broken-config.toml");
        std::fs::write(&path, "history_size = \"ten\"").unwrap();
        assert!(load(Some(path.as_path()), None).is_err());
        assert_eq!(load(None, Some(path)).unwrap(), Config::default());
        assert!(load(Some(Path::new("/nonexistent/navsync.toml")), None).is_err());
    }
}
