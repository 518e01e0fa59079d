use std::error::Error as _;

use thiserror::Error;

/// Everything that can end an invocation early.
///
/// Each variant maps to one stage of the pipeline. The `Display` output is
/// what callers see in the `message` field of an error response.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A required environment value is absent or empty.
    #[error("{key} is not set")]
    Configuration { key: &'static str },

    #[error("Error connecting to database: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Timed out after {0}s connecting to database")]
    ConnectTimeout(u64),

    #[error("Error creating table: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Weather API request failed with status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Weather API request failed: {0}")]
    UpstreamTransport(#[source] reqwest::Error),

    #[error("Unexpected weather API response: {0}")]
    DataExtraction(#[source] serde_json::Error),

    #[error("Error storing weather reading: {0}")]
    Persistence(#[source] sqlx::Error),
}

/// Coarse classification of [`IngestError`], one per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Schema,
    Upstream,
    DataExtraction,
    Persistence,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Configuration { .. } => ErrorKind::Configuration,
            IngestError::Connection(_) | IngestError::ConnectTimeout(_) => ErrorKind::Connection,
            IngestError::Schema(_) => ErrorKind::Schema,
            IngestError::UpstreamStatus { .. } | IngestError::UpstreamTransport(_) => {
                ErrorKind::Upstream
            }
            IngestError::DataExtraction(_) => ErrorKind::DataExtraction,
            IngestError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Message followed by every underlying cause, outermost first.
    ///
    /// Causes whose text already appears in the output are skipped, since
    /// most messages embed their direct source.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !out.contains(&text) {
                out.push_str(": caused by: ");
                out.push_str(&text);
            }
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }

    impl std::error::Error for Refused {}

    #[derive(Debug)]
    struct Handshake(Refused);

    impl fmt::Display for Handshake {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("handshake failed")
        }
    }

    impl std::error::Error for Handshake {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn configuration_error_names_the_key() {
        let err = IngestError::Configuration {
            key: "OPENWEATHER_API_KEY",
        };
        assert_eq!(err.to_string(), "OPENWEATHER_API_KEY is not set");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn chain_does_not_repeat_the_direct_source() {
        let err = IngestError::Connection(sqlx::Error::Protocol("access denied".into()));

        let chain = err.chain();
        assert_eq!(chain, err.to_string());
        assert_eq!(chain.matches("access denied").count(), 1);
    }

    #[test]
    fn chain_lists_deeper_causes_once() {
        let err = IngestError::Persistence(sqlx::Error::Configuration(Box::new(Handshake(
            Refused,
        ))));

        let chain = err.chain();
        assert!(chain.starts_with("Error storing weather reading"));
        assert_eq!(chain.matches("handshake failed").count(), 1);
        assert!(chain.ends_with(": caused by: connection refused"));
    }

    #[test]
    fn upstream_variants_share_a_kind() {
        let err = IngestError::UpstreamStatus {
            status: 401,
            body: "nope".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().contains("401"));
    }
}
