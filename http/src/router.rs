use crate::error::AppError;
use axum::{
    extract::State,
    http::header,
    response::{
        IntoResponse,
        Response,
    },
    routing::get,
    Json,
    Router,
};
use eyre::{
    Context as _,
    Result,
};
use logtick_orchestrator::{
    Instrumentation,
    ReportState,
};
use std::{
    net::SocketAddr,
    path::Path,
    sync::Arc,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    services::ServeDir,
    trace::TraceLayer,
};

const NO_METRICS_YET: &str = "No metrics available yet.";

#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<ReportState>,
    pub instrumentation: Arc<Instrumentation>,
}

/// Local endpoints: the latest report, the scrape endpoint and the static UI.
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    let assets = ServeDir::new(static_dir);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/current_metrics", get(current_metrics))
        .route("/metrics", get(metrics))
        .nest_service("/static", assets.clone())
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `router` on `listen_address` until `token` is cancelled.
pub async fn serve(listen_address: SocketAddr, router: Router, token: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(listen_address)
        .await
        .wrap_err_with(|| format!("Failed to bind {listen_address}"))?;
    info!(address = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .wrap_err("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn current_metrics(State(state): State<AppState>) -> Response {
    match state.reports.latest() {
        Some(report) => Json(&*report).into_response(),
        None => Json(serde_json::json!({ "error": NO_METRICS_YET })).into_response(),
    }
}

async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.instrumentation.encode()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}
