//! Store endpoints.
//!
//! An [`Endpoint`] is a parsed connection string of the form
//! `scheme://location[/database][?options]`. Parsing only checks the shape;
//! whether the scheme is supported and the store reachable is decided by the
//! [`StoreProvider`](crate::provider::StoreProvider) that opens it.

use std::{fmt, str::FromStr};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A parsed store connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    raw: String,
    scheme: String,
    host: String,
    database: Option<String>,
}

impl Endpoint {
    /// Parses a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`] if the string is empty, has no
    /// `://` separator, or has an empty or invalid scheme.
    pub fn parse(input: &str) -> DocumentStoreResult<Self> {
        let raw = input.trim();

        if raw.is_empty() {
            return Err(DocumentStoreError::Connection("endpoint is empty".to_string()));
        }

        let (scheme, rest) = raw.split_once("://").ok_or_else(|| {
            DocumentStoreError::Connection(format!("endpoint `{raw}` is missing a scheme"))
        })?;

        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(DocumentStoreError::Connection(format!(
                "endpoint `{raw}` has an invalid scheme"
            )));
        }

        let location = rest
            .split_once('?')
            .map_or(rest, |(location, _)| location);
        let (host, database) = match location.split_once('/') {
            Some((host, path)) => (host, Some(path.trim_matches('/')).filter(|p| !p.is_empty())),
            None => (location, None),
        };

        Ok(Self {
            raw: raw.to_string(),
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            database: database.map(str::to_string),
        })
    }

    /// The connection string as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The lowercase scheme, for example `mongodb` or `memory`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Everything between the scheme separator and the first `/`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The database named by the path, if any.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// The database named by the path.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`] if the endpoint names no database.
    pub fn require_database(&self) -> DocumentStoreResult<&str> {
        self.database().ok_or_else(|| {
            DocumentStoreError::Connection(format!(
                "endpoint `{}` does not name a database",
                self.raw
            ))
        })
    }
}

impl FromStr for Endpoint {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
