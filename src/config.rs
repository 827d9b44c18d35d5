use crate::error::NotebookError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Variables whose values are taken verbatim.
const TEXT_KEYS: &[&str] = &[
    "DB_PATH",
    "UPLOAD_DIR",
    "ADMIN_USER",
    "ADMIN_PASS",
    "HOST",
    "LOGLEVEL",
];

/// Variables parsed by figment's value inference.
const NUMERIC_KEYS: &[&str] = &["PORT", "DB_MAX_CONNECTIONS", "DB_BUSY_TIMEOUT_SECS"];

/// Process-wide configuration, read once at startup and passed by reference
/// to every stage. Nothing re-reads the environment after this is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub admin_user: String,
    pub admin_pass: Secret,
    pub host: String,
    pub port: u16,
    pub loglevel: String,
    pub db_max_connections: u32,
    pub db_busy_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("/data/people.db"),
            upload_dir: PathBuf::from("/data/uploads"),
            admin_user: "admin".to_string(),
            admin_pass: Secret::default(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            loglevel: "info".to_string(),
            db_max_connections: 5,
            db_busy_timeout_secs: 5,
        }
    }
}

impl Config {
    /// Layered source: defaults, then numeric env vars, then text env vars.
    ///
    /// Text values bypass figment's type inference so `ADMIN_PASS=007` stays
    /// `007` instead of becoming the integer `7`.
    /// A set variable that is not valid UTF-8 is an error, never a fallback
    /// to the default.
    pub fn figment() -> Result<Figment, NotebookError> {
        Ok(Figment::new()
            .merge(Env::raw().only(NUMERIC_KEYS))
            .merge(Serialized::defaults(verbatim_env(TEXT_KEYS)?)))
    }

    pub fn from_env() -> Result<Self, NotebookError> {
        Self::figment()?
            .extract()
            .map_err(|e| NotebookError::Config(Box::new(e)))
    }

    /// Directory holding the database file. A bare file name resolves to `.`.
    pub fn database_dir(&self) -> PathBuf {
        match self.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.db_busy_timeout_secs)
    }

    /// Log every effective setting once. The password is shown redacted.
    pub fn log_effective(&self) {
        info!(
            db_path = %self.db_path.display(),
            upload_dir = %self.upload_dir.display(),
            listen = %self.listen_addr(),
            admin_user = %self.admin_user,
            admin_pass = ?self.admin_pass,
            loglevel = %self.loglevel,
            db_max_connections = self.db_max_connections,
            db_busy_timeout_secs = self.db_busy_timeout_secs,
            "effective configuration"
        );
    }

    /// Human-readable listen address, bracketing IPv6 literals.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn verbatim_env(keys: &[&str]) -> Result<BTreeMap<String, String>, NotebookError> {
    let mut values = BTreeMap::new();
    for &key in keys {
        if let Some(value) = text_value(key, std::env::var_os(key))? {
            values.insert(key.to_ascii_lowercase(), value);
        }
    }
    Ok(values)
}

fn text_value(key: &str, raw: Option<OsString>) -> Result<Option<String>, NotebookError> {
    raw.map(|value| {
        value.into_string().map_err(|_| {
            NotebookError::Config(Box::new(figment::Error::from(format!(
                "{key} is set but is not valid UTF-8"
            ))))
        })
    })
    .transpose()
}

/// Plaintext credential held only in memory. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<unset>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}
