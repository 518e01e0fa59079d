use async_trait::async_trait;
use sqlx::{
    ConnectOptions, Connection,
    sqlite::{SqliteConnectOptions, SqliteConnection},
};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Connector, Dialect, Session, connect_with_timeout};
use crate::{IngestError, WeatherReading, config::DbCredentials};

/// Local SQLite file standing in for the managed instance.
///
/// Credentials are accepted but unused; the file is created on first open.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn open(&self, _creds: &DbCredentials) -> Result<Box<dyn Session>, IngestError> {
        debug!(path = %self.path.display(), "opening SQLite session");

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);
        let conn = connect_with_timeout(options.connect(), None).await?;

        Ok(Box::new(SqliteSession { conn: Some(conn) }))
    }
}

pub struct SqliteSession {
    conn: Option<SqliteConnection>,
}

impl SqliteSession {
    fn conn(&mut self) -> Result<&mut SqliteConnection, sqlx::Error> {
        self.conn
            .as_mut()
            .ok_or_else(|| sqlx::Error::Protocol("session already closed".into()))
    }
}

#[async_trait]
impl Session for SqliteSession {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute_ddl(&mut self, ddl: &str) -> Result<(), sqlx::Error> {
        sqlx::query(ddl).execute(self.conn()?).await?;
        Ok(())
    }

    async fn insert_reading(
        &mut self,
        sql: &str,
        reading: &WeatherReading,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = self.conn()?.begin().await?;
        let result = sqlx::query(sql)
            .bind(reading.city.as_str())
            .bind(reading.temperature_c)
            .bind(reading.humidity_pct)
            .bind(reading.observed_at.naive_utc())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn close(&mut self) -> Result<(), sqlx::Error> {
        match self.conn.take() {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> DbCredentials {
        DbCredentials {
            instance_connection_name: "local".into(),
            user: "u".into(),
            password: "p".into(),
            database: "weather".into(),
        }
    }

    #[tokio::test]
    async fn open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SqliteConnector::new(dir.path().join("weather.db"));

        let mut session = connector.open(&creds()).await.unwrap();
        assert_eq!(session.dialect(), Dialect::Sqlite);
        session.close().await.unwrap();

        assert!(connector.path().exists());
    }

    #[tokio::test]
    async fn close_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let connector = SqliteConnector::new(dir.path().join("weather.db"));

        let mut session = connector.open(&creds()).await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();

        let err = session.execute_ddl("SELECT 1").await.unwrap_err();
        assert!(err.to_string().contains("session already closed"));
    }

    #[tokio::test]
    async fn missing_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/weather.db");
        let connector = SqliteConnector::new(path);

        assert!(connector.open(&creds()).await.is_err());
    }
}
