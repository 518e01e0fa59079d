use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One current-weather observation, built and discarded within an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub city: String,
    pub temperature_c: f64,
    pub humidity_pct: i32,
    /// Local clock at the moment the response was parsed.
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Body returned to whoever triggered the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl InvocationResponse {
    pub const SUCCESS_MESSAGE: &'static str = "Data fetched and stored";

    pub fn success() -> Self {
        Self {
            status: ResponseStatus::Success,
            message: Self::SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// HTTP status code matching the response: 200 or 500.
    pub fn status_code(&self) -> u16 {
        match self.status {
            ResponseStatus::Success => 200,
            ResponseStatus::Error => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_serializes_like_the_trigger_expects() {
        let json = serde_json::to_value(InvocationResponse::success()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "success", "message": "Data fetched and stored"})
        );
        assert_eq!(InvocationResponse::success().status_code(), 200);
    }

    #[test]
    fn error_response_uses_500() {
        let resp = InvocationResponse::error("OPENWEATHER_API_KEY is not set");
        assert_eq!(resp.status_code(), 500);
        assert!(!resp.is_success());

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "OPENWEATHER_API_KEY is not set");
    }
}
