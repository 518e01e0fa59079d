//! Core library for the `weather-ingest` job.
//!
//! This crate defines:
//! - Environment configuration and optional on-disk settings
//! - The OpenWeather provider
//! - Per-invocation database sessions, schema setup and row persistence
//! - The workflow that sequences them and produces the invocation response
//!
//! It is used by `weather-ingest-cli`, but can also be embedded in other triggers.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod persist;
pub mod provider;
pub mod schema;
pub mod settings;
pub mod workflow;

pub use config::{Config, DbCredentials, EnvSource, ProcessEnv};
pub use db::{Connector, Session, StoreConnector};
pub use error::{ErrorKind, IngestError};
pub use model::{InvocationResponse, ResponseStatus, WeatherReading};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use settings::Settings;
pub use workflow::{Verbosity, Workflow, WorkflowOptions};

/// Workflow wired to the settings-selected store and OpenWeather.
pub type DefaultWorkflow = Workflow<StoreConnector, OpenWeatherProvider>;

/// Build a [`DefaultWorkflow`] from settings.
pub fn workflow_from_settings(settings: &Settings) -> anyhow::Result<DefaultWorkflow> {
    let provider = provider::provider_from_settings(&settings.weather)?;
    let connector = StoreConnector::from_settings(&settings.database);
    let options = WorkflowOptions {
        city: settings.city.clone(),
        verbosity: settings.verbosity,
    };

    Ok(Workflow::new(connector, provider, options))
}
