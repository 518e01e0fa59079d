use tracing::error;

use crate::{
    IngestError,
    db::{Dialect, Session},
};

const MYSQL_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_data (
        id INT AUTO_INCREMENT PRIMARY KEY,
        city VARCHAR(100),
        temperature FLOAT,
        humidity INT,
        timestamp DATETIME
    )
"#;

const SQLITE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        city VARCHAR(100),
        temperature FLOAT,
        humidity INT,
        timestamp DATETIME
    )
"#;

/// `CREATE TABLE IF NOT EXISTS` statement for the session's dialect.
pub fn create_table_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySql => MYSQL_DDL,
        Dialect::Sqlite => SQLITE_DDL,
    }
}

/// Create `weather_data` unless it already exists. Safe to call every invocation.
pub async fn ensure_schema(session: &mut dyn Session) -> Result<(), IngestError> {
    let ddl = create_table_sql(session.dialect());

    session.execute_ddl(ddl).await.map_err(|e| {
        error!(error = %e, "Error creating table");
        IngestError::Schema(e)
    })
}
