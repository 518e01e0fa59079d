//! HTTP trigger: every request to `/` runs one independent invocation.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use weather_ingest_core::{Connector, InvocationResponse, ProcessEnv, WeatherProvider, Workflow};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

pub fn router<C, P>(workflow: Arc<Workflow<C, P>>) -> Router
where
    C: Connector + 'static,
    P: WeatherProvider + 'static,
{
    Router::new()
        .route("/", get(invoke::<C, P>).post(invoke::<C, P>))
        .route("/health", get(health))
        .with_state(workflow)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve<C, P>(workflow: Workflow<C, P>, addr: SocketAddr) -> anyhow::Result<()>
where
    C: Connector + 'static,
    P: WeatherProvider + 'static,
{
    let app = router(Arc::new(workflow));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening for invocations on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

/// Listen address from `HOST` and `PORT`, with defaults.
pub fn addr_from_env() -> anyhow::Result<SocketAddr> {
    addr_from(std::env::var("HOST").ok(), std::env::var("PORT").ok())
}

fn addr_from(host: Option<String>, port: Option<String>) -> anyhow::Result<SocketAddr> {
    let host: IpAddr = host
        .as_deref()
        .unwrap_or(DEFAULT_HOST)
        .parse()
        .context("HOST must be an IP address")?;
    let port = match port {
        Some(port) => port.parse().context("PORT must be a number")?,
        None => DEFAULT_PORT,
    };

    Ok(SocketAddr::new(host, port))
}

async fn invoke<C, P>(
    State(workflow): State<Arc<Workflow<C, P>>>,
) -> (StatusCode, Json<InvocationResponse>)
where
    C: Connector + 'static,
    P: WeatherProvider + 'static,
{
    to_http(workflow.invoke(&ProcessEnv).await)
}

fn to_http(response: InvocationResponse) -> (StatusCode, Json<InvocationResponse>) {
    let code = StatusCode::from_u16(response.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(response))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_defaults() {
        let addr = addr_from(None, None).unwrap();
        assert_eq!(addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn addr_from_host_and_port() {
        let host = Some("127.0.0.1".into());
        let addr = addr_from(host, Some("3000".into())).unwrap();
        assert_eq!(addr, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = addr_from(None, Some("eighty".into())).unwrap_err();
        assert!(err.to_string().contains("PORT must be a number"));
    }

    #[test]
    fn responses_map_to_status_codes() {
        let (code, Json(body)) = to_http(InvocationResponse::success());
        assert_eq!(code, StatusCode::OK);
        assert!(body.is_success());

        let (code, Json(body)) = to_http(InvocationResponse::error("DB_USER is not set"));
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "DB_USER is not set");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
