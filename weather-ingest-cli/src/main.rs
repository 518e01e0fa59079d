//! Binary crate for the `weather-ingest` job.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading settings
//! - Logging setup
//! - Triggering invocations once (`run`) or per HTTP request (`serve`)

use clap::Parser;

mod cli;
mod logging;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cmd = cli::Cli::parse();
    // Settings come first so a file-configured verbosity reaches the log filter.
    let settings = cmd.settings()?;
    logging::init(settings.verbosity, cmd.log_json);
    cmd.run(settings).await
}
