//! Filesystem locations for configuration, data and logs.
//!
//! Follows the XDG base directory layout: data under `$XDG_DATA_HOME/miley` (default
//! `~/.local/share/miley`) and configuration under `$XDG_CONFIG_HOME/miley` (default
//! `~/.config/miley`). Resolution takes an environment lookup so it can be tested
//! without touching the process environment.

use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "miley";

/// File holding the persisted sign-in session.
pub const SESSION_FILE: &str = "session.json";

/// File backing the local development store.
pub const STORE_FILE: &str = "miley.json";

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Returns the data directory for the current environment.
#[must_use]
pub fn data_dir() -> PathBuf {
    data_dir_from(|key| env::var(key).ok())
}

/// Returns the configuration directory for the current environment.
#[must_use]
pub fn config_dir() -> PathBuf {
    config_dir_from(|key| env::var(key).ok())
}

/// Default location of the configuration file.
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Resolves the data directory using `lookup` for environment variables.
///
/// ```
/// use miley::infrastructure::paths::data_dir_from;
/// use std::path::PathBuf;
///
/// let dir = data_dir_from(|key| (key == "HOME").then(|| "/home/rider".to_string()));
/// assert_eq!(dir, PathBuf::from("/home/rider/.local/share/miley"));
/// ```
pub fn data_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    base_dir(&lookup, "XDG_DATA_HOME", &[".local", "share"]).join(APP_DIR)
}

/// Resolves the configuration directory using `lookup` for environment variables.
pub fn config_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    base_dir(&lookup, "XDG_CONFIG_HOME", &[".config"]).join(APP_DIR)
}

fn base_dir(lookup: &impl Fn(&str) -> Option<String>, xdg_var: &str, fallback: &[&str]) -> PathBuf {
    if let Some(dir) = lookup(xdg_var).filter(|d| Path::new(d).is_absolute()) {
        return PathBuf::from(dir);
    }
    match lookup("HOME").filter(|h| !h.is_empty()) {
        Some(home) => fallback.iter().fold(PathBuf::from(home), |p, part| p.join(part)),
        None => PathBuf::from("."),
    }
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a tilde, and tildes when `HOME` is unset, are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_with(path, env::var("HOME").ok().as_deref())
}

/// Expands a leading `~` against an explicit home directory.
///
/// ```
/// use miley::infrastructure::paths::expand_tilde_with;
/// use std::path::PathBuf;
///
/// let home = Some("/home/rider");
/// assert_eq!(expand_tilde_with("~/exports", home), PathBuf::from("/home/rider/exports"));
/// assert_eq!(expand_tilde_with("~", home), PathBuf::from("/home/rider"));
/// assert_eq!(expand_tilde_with("/srv/exports", home), PathBuf::from("/srv/exports"));
/// ```
#[must_use]
pub fn expand_tilde_with(path: &str, home: Option<&str>) -> PathBuf {
    match (home, path.strip_prefix('~')) {
        (Some(home), Some("")) => PathBuf::from(home),
        (Some(home), Some(rest)) if rest.starts_with('/') => {
            PathBuf::from(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}
