use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use weather_ingest_core::Verbosity;

/// Install the global subscriber. `RUST_LOG` wins over the settings' verbosity.
pub fn init(verbosity: Verbosity, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(verbosity).into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Filter used when `RUST_LOG` is unset. Diagnostic runs also keep the
/// request and session events the core logs at `debug`.
fn default_directives(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Diagnostic => "weather_ingest_core=debug,weather_ingest=debug,tower_http=debug",
        Verbosity::Standard => "weather_ingest_core=info,weather_ingest=info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_keeps_core_debug_events() {
        let directives = default_directives(Verbosity::Diagnostic);
        assert!(directives.contains("weather_ingest_core=debug"));
        assert!(directives.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn standard_stays_at_info() {
        let directives = default_directives(Verbosity::Standard);
        assert!(directives.contains("weather_ingest_core=info"));
        assert!(!directives.contains("debug"));
    }
}
