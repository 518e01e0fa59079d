//! Database sessions scoped to a single invocation.
//!
//! A [`Connector`] knows where the store lives; every call to
//! [`Connector::open`] yields a fresh [`Session`] owning one connection.
//! Nothing is shared between invocations.

use async_trait::async_trait;
use std::{future::Future, time::Duration};
use tracing::error;

use crate::{IngestError, WeatherReading, config::DbCredentials, settings::DatabaseSettings};

pub mod mysql;
pub mod sqlite;

pub use mysql::{MySqlConnector, MySqlSession};
pub use sqlite::{SqliteConnector, SqliteSession};

/// SQL flavour spoken by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

/// One live connection, owned by one invocation.
#[async_trait]
pub trait Session: Send {
    fn dialect(&self) -> Dialect;

    /// Run a schema statement.
    async fn execute_ddl(&mut self, ddl: &str) -> Result<(), sqlx::Error>;

    /// Bind `reading` to `sql` (city, temperature, humidity, timestamp) and
    /// run it inside a committed transaction. Returns rows affected.
    async fn insert_reading(
        &mut self,
        sql: &str,
        reading: &WeatherReading,
    ) -> Result<u64, sqlx::Error>;

    /// Release the connection. Later calls are no-ops.
    async fn close(&mut self) -> Result<(), sqlx::Error>;
}

/// Opens sessions against a store.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, creds: &DbCredentials) -> Result<Box<dyn Session>, IngestError>;
}

/// The connector selected by settings.
#[derive(Debug, Clone)]
pub enum StoreConnector {
    MySql(MySqlConnector),
    Sqlite(SqliteConnector),
}

impl StoreConnector {
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        match &settings.sqlite_path {
            Some(path) => StoreConnector::Sqlite(SqliteConnector::new(path)),
            None => StoreConnector::MySql(MySqlConnector::from_settings(settings)),
        }
    }
}

#[async_trait]
impl Connector for StoreConnector {
    async fn open(&self, creds: &DbCredentials) -> Result<Box<dyn Session>, IngestError> {
        match self {
            StoreConnector::MySql(c) => c.open(creds).await,
            StoreConnector::Sqlite(c) => c.open(creds).await,
        }
    }
}

/// Await a connect future, optionally bounded, logging any failure.
pub(crate) async fn connect_with_timeout<T, F>(
    fut: F,
    timeout: Option<Duration>,
) -> Result<T, IngestError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res.map_err(IngestError::Connection),
            Err(_) => Err(IngestError::ConnectTimeout(limit.as_secs())),
        },
        None => fut.await.map_err(IngestError::Connection),
    };

    if let Err(e) = &result {
        error!(error = %e, "Error connecting to database");
    }
    result
}
