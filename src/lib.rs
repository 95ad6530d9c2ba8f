//! Miley: a motorcycle fuel mileage tracker.
//!
//! Riders record each fillup (date, odometer, liters, cost, pump) against one of their
//! motorcycles. Miley derives the mileage achieved since the previous fillup and the
//! average over the whole history, and exports everything as a CSV spreadsheet.
//! Records live in a hosted PostgREST store scoped to the signed-in user; a local JSON
//! file can stand in for it during development.

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs)                                      │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← State machine
//! │  - Event handling                                   │
//! │  - Store-backed commands                            │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Storage Layer │   │ Export        │
//! │ (ui/)         │   │ (storage/)    │   │ (export/)     │
//! │ - Dashboard   │   │ - PostgREST   │   │ - CSV         │
//! │ - Formatting  │   │ - JSON file   │   │               │
//! │               │   │ - In-memory   │   │               │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain & Infrastructure                            │
//! │  - Vehicles, fillups, mileage (domain/)             │
//! │  - Error types (domain/error)                       │
//! │  - Platform paths (infrastructure/)                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Application state with event/action model
//! - [`domain`]: Vehicles, fillups, mileage calculation and errors
//! - [`export`]: CSV export
//! - [`infrastructure`]: Platform paths
//! - [`storage`]: Store trait and its hosted, file and in-memory implementations
//! - [`ui`]: Plain-text dashboard
//! - [`observability`]: Logging to a rotating file
//!
//! # Configuration
//!
//! Settings are read from `~/.config/miley/config.toml` and overridden by `MILEY_*`
//! environment variables (a `.env` file in the working directory is honoured):
//!
//! ```toml
//! backend = "postgrest"
//! supabase_url = "https://xyzcompany.supabase.co"
//! supabase_anon_key = "eyJhbGciOi..."
//! export_dir = "~/Downloads"
//! date_format = "%-d/%-m/%Y"
//! log_level = "info"
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use miley::app::handle_event;
//! use miley::domain::{SessionUser, VehicleForm};
//! use miley::storage::MemoryStore;
//! use miley::{initialize, Config, Event};
//!
//! let user = SessionUser { id: "u1".into(), email: None };
//! let mut store = MemoryStore::new(user.clone());
//! let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
//! let mut state = initialize(&Config::default(), user, today);
//!
//! handle_event(&mut state, &mut store, &Event::Load);
//! state.vehicle_form = VehicleForm::new("Daily", "Classic 350");
//! handle_event(&mut state, &mut store, &Event::SubmitVehicle);
//! assert_eq!(state.vehicles.len(), 1);
//! ```

pub mod app;
pub mod domain;
pub mod export;
pub mod infrastructure;
pub mod observability;
pub mod storage;
pub mod ui;

pub use app::{handle_event, Action, AppState, Event};
pub use domain::{MileyError, Result, SessionUser};

use app::state::DEFAULT_DATE_FORMAT;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The hosted PostgREST store.
    #[default]
    Postgrest,
    /// A single-user JSON file in the data directory.
    File,
}

impl FromStr for Backend {
    type Err = MileyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgrest" => Ok(Self::Postgrest),
            "file" => Ok(Self::File),
            other => Err(MileyError::Config(format!(
                "unknown backend '{other}' (expected 'postgrest' or 'file')"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgrest => f.write_str("postgrest"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,

    /// Base URL of the hosted project, e.g. `https://xyz.supabase.co`.
    pub supabase_url: Option<String>,

    /// Public (anon) API key of the hosted project.
    pub supabase_anon_key: Option<String>,

    /// Holds the session, the log file and the JSON store.
    pub data_dir: PathBuf,

    /// Where exported CSV files are written. Default: the working directory.
    pub export_dir: PathBuf,

    /// chrono format string for displayed and exported dates. Default: `%-d/%-m/%Y`.
    pub date_format: String,

    /// Log filter directive, e.g. `debug` or `miley=trace`. Default: `info`.
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            supabase_url: None,
            supabase_anon_key: None,
            data_dir: infrastructure::data_dir(),
            export_dir: PathBuf::from("."),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            log_level: None,
        }
    }
}

/// On-disk form of [`Config`]; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    backend: Option<Backend>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    data_dir: Option<String>,
    export_dir: Option<String>,
    date_format: Option<String>,
    log_level: Option<String>,
}

/// Environment variables and the configuration keys they override.
const ENV_KEYS: [(&str, &str); 7] = [
    ("MILEY_BACKEND", "backend"),
    ("MILEY_SUPABASE_URL", "supabase_url"),
    ("MILEY_SUPABASE_ANON_KEY", "supabase_anon_key"),
    ("MILEY_DATA_DIR", "data_dir"),
    ("MILEY_EXPORT_DIR", "export_dir"),
    ("MILEY_DATE_FORMAT", "date_format"),
    ("MILEY_LOG", "log_level"),
];

impl Config {
    /// Loads configuration from `path` (or the default config file) and the environment.
    ///
    /// A missing default config file is not an error; a missing explicit `path` is.
    ///
    /// # Errors
    ///
    /// Returns [`MileyError::Config`] if the file cannot be read or parsed, or any value
    /// is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(dotenv) = dotenvy::dotenv() {
            tracing::debug!(path = ?dotenv, "loaded .env");
        }

        let explicit = path.is_some();
        let path = path.map_or_else(infrastructure::config_file, Path::to_path_buf);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => Self::default(),
            Err(e) => {
                return Err(MileyError::Config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };

        let vars = std::env::vars_os().filter_map(|(name, value)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        });
        config.apply_map(&env_overrides(vars))?;
        Ok(config)
    }

    /// Parses a TOML document on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MileyError::Config`] on malformed TOML, unknown keys or invalid values.
    ///
    /// ```
    /// use miley::{Backend, Config};
    ///
    /// let config = Config::from_toml_str("backend = \"file\"\ndate_format = \"%d.%m.%Y\"").unwrap();
    /// assert_eq!(config.backend, Backend::File);
    /// assert_eq!(config.date_format, "%d.%m.%Y");
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| MileyError::Config(format!("invalid config: {e}")))?;

        let defaults = Self::default();
        let config = Self {
            backend: file.backend.unwrap_or(defaults.backend),
            supabase_url: file.supabase_url.or(defaults.supabase_url),
            supabase_anon_key: file.supabase_anon_key.or(defaults.supabase_anon_key),
            data_dir: file
                .data_dir
                .map_or(defaults.data_dir, |d| infrastructure::expand_tilde(&d)),
            export_dir: file
                .export_dir
                .map_or(defaults.export_dir, |d| infrastructure::expand_tilde(&d)),
            date_format: file.date_format.unwrap_or(defaults.date_format),
            log_level: file.log_level.or(defaults.log_level),
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds configuration from a string map on top of the defaults.
    ///
    /// Keys match the TOML file. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MileyError::Config`] if a value is invalid.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use miley::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("supabase_url".to_string(), "https://xyz.supabase.co".to_string());
    /// map.insert("log_level".to_string(), "debug".to_string());
    ///
    /// let config = Config::from_map(&map).unwrap();
    /// assert_eq!(config.supabase_url.as_deref(), Some("https://xyz.supabase.co"));
    /// assert_eq!(config.log_level.as_deref(), Some("debug"));
    /// ```
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_map(map)?;
        Ok(config)
    }

    /// Overrides fields with the non-empty values in `map`.
    ///
    /// # Errors
    ///
    /// Returns [`MileyError::Config`] if a value is invalid.
    pub fn apply_map(&mut self, map: &BTreeMap<String, String>) -> Result<()> {
        let get = |key: &str| map.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(backend) = get("backend") {
            self.backend = backend.parse()?;
        }
        if let Some(url) = get("supabase_url") {
            self.supabase_url = Some(url.to_string());
        }
        if let Some(key) = get("supabase_anon_key") {
            self.supabase_anon_key = Some(key.to_string());
        }
        if let Some(dir) = get("data_dir") {
            self.data_dir = infrastructure::expand_tilde(dir);
        }
        if let Some(dir) = get("export_dir") {
            self.export_dir = infrastructure::expand_tilde(dir);
        }
        if let Some(format) = get("date_format") {
            self.date_format = format.to_string();
        }
        if let Some(level) = get("log_level") {
            self.log_level = Some(level.to_string());
        }

        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if !ui::helpers::is_valid_date_format(&self.date_format) {
            return Err(MileyError::Config(format!(
                "invalid date_format '{}'",
                self.date_format
            )));
        }
        Ok(())
    }

    /// Path of the persisted sign-in session.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(infrastructure::paths::SESSION_FILE)
    }

    /// Path of the JSON store used by the `file` backend.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(infrastructure::paths::STORE_FILE)
    }
}

/// Collects `MILEY_*` variables into a map keyed like the config file.
fn env_overrides(vars: impl Iterator<Item = (String, String)>) -> BTreeMap<String, String> {
    vars.filter_map(|(name, value)| {
        ENV_KEYS
            .iter()
            .find(|(env, _)| *env == name)
            .map(|(_, key)| ((*key).to_string(), value))
    })
    .collect()
}

/// Creates the application state for a signed-in user.
///
/// The returned state is empty; send [`Event::Load`] to fetch the user's records.
#[must_use]
pub fn initialize(config: &Config, user: SessionUser, today: NaiveDate) -> AppState {
    tracing::debug!(
        backend = %config.backend,
        user_id = %user.id,
        "initializing miley"
    );
    AppState::new(user, today).with_date_format(config.date_format.clone())
}
