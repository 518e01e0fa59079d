use tracing::error;

use crate::{IngestError, WeatherReading, db::Session};

/// Placeholder-bound insert; both supported dialects use `?`.
pub const INSERT_READING_SQL: &str =
    "INSERT INTO weather_data (city, temperature, humidity, timestamp) VALUES (?, ?, ?, ?)";

/// Append one row for `reading` and commit it.
pub async fn persist(
    session: &mut dyn Session,
    reading: &WeatherReading,
) -> Result<(), IngestError> {
    let inserted = session.insert_reading(INSERT_READING_SQL, reading).await;
    inserted.map_err(|e| {
        error!(error = %e, city = %reading.city, "Error storing weather reading");
        IngestError::Persistence(e)
    })?;

    Ok(())
}
