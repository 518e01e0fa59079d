//! Required values read from the process environment.

use std::{collections::HashMap, fmt};

use crate::error::IngestError;

pub const INSTANCE_CONNECTION_NAME: &str = "INSTANCE_CONNECTION_NAME";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASS: &str = "DB_PASS";
pub const DB_NAME: &str = "DB_NAME";
pub const OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";

/// Source of environment values. Lets tests supply a map instead of
/// mutating the process environment.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Credentials for the managed database instance.
#[derive(Clone)]
pub struct DbCredentials {
    pub instance_connection_name: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("instance_connection_name", &self.instance_connection_name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Everything an invocation needs from the environment.
#[derive(Clone)]
pub struct Config {
    pub db: DbCredentials,
    pub api_key: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db", &self.db)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Read the five required values, failing on the first one missing.
    ///
    /// Keys are checked in a fixed order: instance, user, password,
    /// database name, API key. Blank values count as missing.
    pub fn from_source(env: &dyn EnvSource) -> Result<Self, IngestError> {
        let db = DbCredentials {
            instance_connection_name: required(env, INSTANCE_CONNECTION_NAME)?,
            user: required(env, DB_USER)?,
            password: required(env, DB_PASS)?,
            database: required(env, DB_NAME)?,
        };
        let api_key = required(env, OPENWEATHER_API_KEY)?;

        Ok(Self { db, api_key })
    }

    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_source(&ProcessEnv)
    }
}

fn required(env: &dyn EnvSource, key: &'static str) -> Result<String, IngestError> {
    match env.var(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(IngestError::Configuration { key }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> HashMap<String, String> {
        [
            (INSTANCE_CONNECTION_NAME, "proj:europe-west2:weather"),
            (DB_USER, "ingest"),
            (DB_PASS, "hunter2"),
            (DB_NAME, "weather"),
            (OPENWEATHER_API_KEY, "abc123"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn loads_all_values() {
        let cfg = Config::from_source(&full_env()).expect("config loads");

        assert_eq!(cfg.db.instance_connection_name, "proj:europe-west2:weather");
        assert_eq!(cfg.db.user, "ingest");
        assert_eq!(cfg.db.password, "hunter2");
        assert_eq!(cfg.db.database, "weather");
        assert_eq!(cfg.api_key, "abc123");
    }

    #[test]
    fn missing_api_key_is_reported_by_name() {
        let mut env = full_env();
        env.remove(OPENWEATHER_API_KEY);

        let err = Config::from_source(&env).unwrap_err();
        assert_eq!(err.to_string(), "OPENWEATHER_API_KEY is not set");
    }

    #[test]
    fn reports_first_missing_key() {
        let mut env = full_env();
        env.remove(DB_PASS);
        env.remove(OPENWEATHER_API_KEY);

        let err = Config::from_source(&env).unwrap_err();
        assert_eq!(err.to_string(), "DB_PASS is not set");
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = full_env();
        env.insert(DB_USER.to_string(), "   ".to_string());

        let err = Config::from_source(&env).unwrap_err();
        assert_eq!(err.to_string(), "DB_USER is not set");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = Config::from_source(&full_env()).unwrap();
        let debug = format!("{cfg:?}");

        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("ingest"));
    }
}
