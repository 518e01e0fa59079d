use async_trait::async_trait;
use sqlx::{
    ConnectOptions, Connection,
    mysql::{MySqlConnectOptions, MySqlConnection},
};
use std::{path::PathBuf, time::Duration};
use tracing::debug;

use super::{Connector, Dialect, Session, connect_with_timeout};
use crate::{IngestError, WeatherReading, config::DbCredentials, settings::DatabaseSettings};

/// Connects to a managed MySQL instance, through its unix socket by default.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    socket_dir: PathBuf,
    host: Option<String>,
    port: u16,
    connect_timeout: Option<Duration>,
}

impl MySqlConnector {
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        Self {
            socket_dir: settings.socket_dir.clone(),
            host: settings.host.clone(),
            port: settings.port,
            connect_timeout: settings.connect_timeout(),
        }
    }

    /// Socket the instance proxy listens on: `<socket_dir>/<instance>`.
    pub fn socket_path(&self, instance_connection_name: &str) -> PathBuf {
        self.socket_dir.join(instance_connection_name)
    }

    fn endpoint(&self, creds: &DbCredentials) -> Endpoint {
        match &self.host {
            Some(host) => Endpoint::Tcp {
                host: host.clone(),
                port: self.port,
            },
            None => Endpoint::Socket(self.socket_path(&creds.instance_connection_name)),
        }
    }

    fn connect_options(&self, creds: &DbCredentials) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .username(&creds.user)
            .password(&creds.password)
            .database(&creds.database);

        match self.endpoint(creds) {
            Endpoint::Tcp { host, port } => options.host(&host).port(port),
            Endpoint::Socket(path) => options.socket(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Socket(PathBuf),
    Tcp { host: String, port: u16 },
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn open(&self, creds: &DbCredentials) -> Result<Box<dyn Session>, IngestError> {
        debug!(
            instance = %creds.instance_connection_name,
            database = %creds.database,
            "opening MySQL session"
        );

        let options = self.connect_options(creds);
        let timeout = self.connect_timeout;
        let conn = connect_with_timeout(options.connect(), timeout).await?;

        Ok(Box::new(MySqlSession { conn: Some(conn) }))
    }
}

pub struct MySqlSession {
    conn: Option<MySqlConnection>,
}

impl MySqlSession {
    fn conn(&mut self) -> Result<&mut MySqlConnection, sqlx::Error> {
        self.conn
            .as_mut()
            .ok_or_else(|| sqlx::Error::Protocol("session already closed".into()))
    }
}

#[async_trait]
impl Session for MySqlSession {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
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
            instance_connection_name: "proj:region:inst".into(),
            user: "u".into(),
            password: "p".into(),
            database: "weather".into(),
        }
    }

    #[test]
    fn socket_path_joins_instance_name() {
        let connector = MySqlConnector::from_settings(&DatabaseSettings::default());
        assert_eq!(
            connector.socket_path("proj:region:inst"),
            PathBuf::from("/cloudsql/proj:region:inst")
        );
    }

    #[test]
    fn host_overrides_socket() {
        let settings = DatabaseSettings {
            host: Some("127.0.0.1".into()),
            port: 3307,
            ..DatabaseSettings::default()
        };
        let endpoint = MySqlConnector::from_settings(&settings).endpoint(&creds());

        let expected = Endpoint::Tcp {
            host: "127.0.0.1".into(),
            port: 3307,
        };
        assert_eq!(endpoint, expected);
    }

    #[test]
    fn default_uses_instance_socket() {
        let connector = MySqlConnector::from_settings(&DatabaseSettings::default());
        let endpoint = connector.endpoint(&creds());

        let socket = PathBuf::from("/cloudsql/proj:region:inst");
        assert_eq!(endpoint, Endpoint::Socket(socket));
    }
}
