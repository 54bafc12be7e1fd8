//! Process-wide connection settings.
//!
//! The default endpoint is read once per process, on first use, from:
//!
//! 1. the `DOCREPO_CONNECTION_STRING` environment variable, else
//! 2. the JSON settings file named by `DOCREPO_CONFIG`, else `./docrepo.json`:
//!
//! ```json
//! { "server": { "connection_string": "mongodb://localhost/MyApp" } }
//! ```
//!
//! A successful resolution is kept for the life of the process. A failed one is
//! not, so a later call can pick up settings that appeared in the meantime.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::{
    endpoint::Endpoint,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Environment variable holding the default connection string.
pub const CONNECTION_STRING_ENV: &str = "DOCREPO_CONNECTION_STRING";

/// Environment variable naming the settings file.
pub const CONFIG_PATH_ENV: &str = "DOCREPO_CONFIG";

/// Settings file looked up in the working directory when `DOCREPO_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "docrepo.json";

static DEFAULT_ENDPOINT: OnceCell<Endpoint> = OnceCell::new();

/// Contents of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub connection_string: Option<String>,
}

impl Settings {
    /// Parses settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Configuration`] if the JSON is malformed.
    pub fn from_json(json: &str) -> DocumentStoreResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            DocumentStoreError::Configuration(format!("invalid settings: {e}"))
        })
    }

    /// Reads settings from `path`, returning `None` if the file does not exist.
    pub fn from_file(path: &Path) -> DocumentStoreResult<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DocumentStoreError::Configuration(format!(
                "cannot read settings file `{}`: {e}",
                path.display()
            ))),
        }
    }

    /// Reads the settings file named by the environment, or the default file.
    pub fn load() -> DocumentStoreResult<Self> {
        let path = env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Ok(Self::from_file(&path)?.unwrap_or_default())
    }

    /// The configured connection string, ignoring blank values.
    pub fn connection_string(&self) -> Option<&str> {
        self.server
            .connection_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Picks the connection string from an environment value and file settings.
///
/// The environment wins over the file.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Configuration`] if neither source provides one.
pub fn select_connection_string(
    from_env: Option<&str>,
    settings: &Settings,
) -> DocumentStoreResult<String> {
    from_env
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| settings.connection_string())
        .map(str::to_string)
        .ok_or_else(|| {
            DocumentStoreError::Configuration(format!(
                "no connection string: set {CONNECTION_STRING_ENV} or server.connection_string in {DEFAULT_CONFIG_FILE}"
            ))
        })
}

/// Returns the process-wide default endpoint, resolving it on first use.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Configuration`] if no connection string is
/// configured, or [`DocumentStoreError::Connection`] if it is malformed.
pub fn default_endpoint() -> DocumentStoreResult<&'static Endpoint> {
    DEFAULT_ENDPOINT.get_or_try_init(|| {
        let from_env = env::var(CONNECTION_STRING_ENV).ok();
        let settings = match from_env {
            Some(_) => Settings::default(),
            None => Settings::load()?,
        };
        let endpoint = Endpoint::parse(&select_connection_string(from_env.as_deref(), &settings)?)?;

        debug!(scheme = endpoint.scheme(), "resolved default endpoint");

        Ok(endpoint)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connection_string_from_settings_json() {
        let settings =
            Settings::from_json(r#"{"server": {"connection_string": "mongodb://localhost/Tests"}}"#)
                .unwrap();

        assert_eq!(settings.connection_string(), Some("mongodb://localhost/Tests"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let settings = Settings::from_json("{}").unwrap();

        assert_eq!(settings.connection_string(), None);
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = Settings::from_json("{server:").unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }

    #[test]
    fn environment_wins_over_file() {
        let settings =
            Settings::from_json(r#"{"server": {"connection_string": "mongodb://file/Db"}}"#).unwrap();

        assert_eq!(
            select_connection_string(Some("memory://env"), &settings).unwrap(),
            "memory://env"
        );
        assert_eq!(
            select_connection_string(Some("  "), &settings).unwrap(),
            "mongodb://file/Db"
        );
    }

    #[test]
    fn no_source_is_a_configuration_error() {
        let err = select_connection_string(None, &Settings::default()).unwrap_err();

        assert!(matches!(err, DocumentStoreError::Configuration(_)));
    }

    #[test]
    fn missing_settings_file_is_not_an_error() {
        let settings = Settings::from_file(Path::new("definitely/not/here/docrepo.json")).unwrap();

        assert!(settings.is_none());
    }
}
