use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use weather_ingest_core::{ProcessEnv, Settings, Verbosity, workflow_from_settings};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-ingest", version, about = "Fetch current weather and store it")]
pub struct Cli {
    /// Settings file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every stage and full error chains.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a single invocation and print the response.
    Run {
        /// City to fetch instead of the configured one.
        #[arg(long)]
        city: Option<String>,
    },

    /// Serve invocations over HTTP.
    Serve {
        /// Listen address; defaults to HOST:PORT or 0.0.0.0:8080.
        #[arg(long)]
        addr: Option<SocketAddr>,

        /// City to fetch instead of the configured one.
        #[arg(long)]
        city: Option<String>,
    },
}

impl Cli {
    /// Settings from `--config` or the default location, with `-v` applied.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        if self.verbose {
            settings.verbosity = Verbosity::Diagnostic;
        }

        Ok(settings)
    }

    pub async fn run(self, mut settings: Settings) -> anyhow::Result<()> {
        match self.command {
            Command::Run { city } => {
                apply_city(&mut settings, city);
                let workflow = workflow_from_settings(&settings)?;

                // Failures are reported in the body, never through the exit code.
                let response = workflow.invoke(&ProcessEnv).await;
                println!("{}", serde_json::to_string(&response)?);
            }
            Command::Serve { addr, city } => {
                apply_city(&mut settings, city);
                let workflow = workflow_from_settings(&settings)?;
                let addr = match addr {
                    Some(addr) => addr,
                    None => server::addr_from_env().context("Invalid HOST/PORT")?,
                };

                server::serve(workflow, addr).await?;
            }
        }

        Ok(())
    }
}

fn apply_city(settings: &mut Settings, city: Option<String>) {
    if let Some(city) = city {
        settings.city = city;
    }
}
