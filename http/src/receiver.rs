//! Development receiver: accepts what an agent sends and logs it.

use crate::error::AppError;
use axum::{
    extract::ws::{
        Message,
        WebSocket,
        WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
    routing::{
        get,
        post,
    },
    Router,
};
use futures::StreamExt;
use tower_http::trace::TraceLayer;

pub fn create_receiver_router() -> Router {
    Router::new()
        .route("/metrics", post(receive_report))
        .route("/ws/logs", get(receive_logs))
        .layer(TraceLayer::new_for_http())
}

async fn receive_report(body: String) -> Result<StatusCode, AppError> {
    let report: serde_json::Value = serde_json::from_str(&body)?;
    info!(
        agent_id = %report["agent_id"],
        agent_name = %report["agent_name"],
        report = %report,
        "Received report"
    );
    Ok(StatusCode::OK)
}

async fn receive_logs(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(mut socket: WebSocket) {
    info!("Log stream connected");
    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => info!(line = %text.as_str(), "Received log line"),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "Log stream read failed");
                break;
            }
        }
    }
    info!("Log stream disconnected");
}
