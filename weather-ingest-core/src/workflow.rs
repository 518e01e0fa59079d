//! The fetch-validate-persist sequence run once per invocation.
//!
//! Order: load config, open a session, ensure the schema, fetch the reading,
//! persist it, and close the session. Every failure ends in an error
//! [`InvocationResponse`]; once a session is open it is closed exactly once
//! before the response is returned.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::{
    IngestError, InvocationResponse, WeatherProvider, WeatherReading,
    config::{Config, EnvSource},
    db::{Connector, Session},
    persist::persist,
    schema::ensure_schema,
};

/// How much the workflow says about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Failures and the final outcome only.
    #[default]
    Standard,
    /// Every stage transition, plus full error chains.
    Diagnostic,
}

/// Progress of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ConfigLoaded,
    SessionOpen,
    SchemaReady,
    Fetched,
    Persisted,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ConfigLoaded => "config_loaded",
            Stage::SessionOpen => "session_open",
            Stage::SchemaReady => "schema_ready",
            Stage::Fetched => "fetched",
            Stage::Persisted => "persisted",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub city: String,
    pub verbosity: Verbosity,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            city: crate::settings::DEFAULT_CITY.to_string(),
            verbosity: Verbosity::default(),
        }
    }
}

/// Everything needed to run invocations. Holds no per-invocation state, so
/// one instance can serve overlapping invocations.
#[derive(Debug)]
pub struct Workflow<C, P> {
    connector: C,
    provider: P,
    options: WorkflowOptions,
}

impl<C, P> Workflow<C, P>
where
    C: Connector,
    P: WeatherProvider,
{
    pub fn new(connector: C, provider: P, options: WorkflowOptions) -> Self {
        Self { connector, provider, options }
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Run one invocation to completion. Never panics on business failure.
    pub async fn invoke(&self, env: &dyn EnvSource) -> InvocationResponse {
        let mut tracker = StageTracker::new(self.options.verbosity);

        match self.execute(env, &mut tracker).await {
            Ok(reading) => {
                tracker.advance(Stage::Done);
                info!(
                    "Successfully stored data for {}: {}°C, {}%",
                    reading.city, reading.temperature_c, reading.humidity_pct
                );
                InvocationResponse::success()
            }
            Err(e) => {
                let failed_at = tracker.current();
                tracker.advance(Stage::Failed);
                match self.options.verbosity {
                    Verbosity::Standard => {
                        error!(stage = %failed_at, error = %e, "Invocation failed")
                    }
                    Verbosity::Diagnostic => error!(
                        stage = %failed_at,
                        kind = ?e.kind(),
                        error = %e.chain(),
                        "Invocation failed"
                    ),
                }
                InvocationResponse::error(e.to_string())
            }
        }
    }

    async fn execute(
        &self,
        env: &dyn EnvSource,
        tracker: &mut StageTracker,
    ) -> Result<WeatherReading, IngestError> {
        let config = Config::from_source(env)?;
        tracker.advance(Stage::ConfigLoaded);

        let mut session = self.connector.open(&config.db).await?;
        tracker.advance(Stage::SessionOpen);

        let outcome = self.with_session(session.as_mut(), &config, tracker).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Error closing database session");
        } else {
            tracker.note("database session closed");
        }

        outcome
    }

    async fn with_session(
        &self,
        session: &mut dyn Session,
        config: &Config,
        tracker: &mut StageTracker,
    ) -> Result<WeatherReading, IngestError> {
        ensure_schema(session).await?;
        tracker.advance(Stage::SchemaReady);

        let reading = self
            .provider
            .fetch_current(&config.api_key, &self.options.city)
            .await?;
        tracker.advance(Stage::Fetched);

        persist(session, &reading).await?;
        tracker.advance(Stage::Persisted);

        Ok(reading)
    }
}

struct StageTracker {
    stage: Stage,
    verbosity: Verbosity,
}

impl StageTracker {
    fn new(verbosity: Verbosity) -> Self {
        Self {
            stage: Stage::Idle,
            verbosity,
        }
    }

    fn current(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        let from = self.stage;
        self.stage = next;
        match self.verbosity {
            Verbosity::Diagnostic => info!(%from, to = %next, "stage transition"),
            Verbosity::Standard => debug!(%from, to = %next, "stage transition"),
        }
    }

    fn note(&self, what: &str) {
        if self.verbosity == Verbosity::Diagnostic {
            info!(stage = %self.stage, "{what}");
        }
    }
}
