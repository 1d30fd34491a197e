use axum::Router;
use futures::{
    SinkExt,
    StreamExt,
};
use logtick_collector::Sample;
use logtick_http::{
    create_receiver_router,
    create_router,
    serve,
    AppState,
};
use logtick_orchestrator::{
    AgentIdentity,
    Instrumentation,
    ReportState,
};
use pretty_assertions::assert_eq;
use serde_json::{
    json,
    Value,
};
use std::{
    net::SocketAddr,
    path::Path,
    sync::Arc,
    time::Duration,
};
use temp_dir::TempDir;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

fn app_state() -> AppState {
    let identity = AgentIdentity {
        id: "id-1".to_string(),
        name: "web-01".to_string(),
    };
    AppState {
        reports: Arc::new(ReportState::new(identity.clone())),
        instrumentation: Arc::new(Instrumentation::new(identity).unwrap()),
    }
}

async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    addr
}

#[tokio::test]
async fn current_metrics_reports_marker_then_latest_report() {
    let state = app_state();
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(create_router(state.clone(), dir.path())).await;
    let url = format!("http://{addr}/api/current_metrics");

    let body: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({"error": "No metrics available yet."}));

    state.reports.update("system", Sample::from(json!({"cpu_percent": 12.5})));
    state.reports.publish(state.reports.snapshot());

    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["agent_id"], "id-1");
    assert_eq!(body["agent_name"], "web-01");
    assert_eq!(body["system_metrics"], json!({"cpu_percent": 12.5}));
    assert!(body.get("mysql_metrics").is_none());
}

#[tokio::test]
async fn metrics_endpoint_exposes_agent_families() {
    let state = app_state();
    state.instrumentation.register_collector("system");
    state.instrumentation.record_collection("system", Duration::from_millis(5));
    state.instrumentation.record_delivery(false);
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(create_router(state, dir.path())).await;

    let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    for family in [
        "agent_metrics_collected_total",
        "agent_metrics_sent_total",
        "agent_collection_duration_seconds",
        "agent_collector_status",
    ] {
        assert!(text.contains(family), "{family} missing");
    }
}

#[tokio::test]
async fn static_ui_and_health_are_served() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.child("index.html"), "<h1>logtick</h1>").unwrap();
    let addr = spawn_server(create_router(app_state(), dir.path())).await;

    let index = reqwest::get(format!("http://{addr}/")).await.unwrap().text().await.unwrap();
    assert_eq!(index, "<h1>logtick</h1>");
    let prefixed = reqwest::get(format!("http://{addr}/static/index.html")).await.unwrap();
    assert_eq!(prefixed.status(), 200);

    let health: Value = reqwest::get(format!("http://{addr}/healthz")).await.unwrap().json().await.unwrap();
    assert_eq!(health, json!({"status": "ok"}));
}

#[tokio::test]
async fn serve_stops_when_cancelled() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let token = CancellationToken::new();
    let server = tokio::spawn(serve(addr, create_router(app_state(), Path::new("web")), token.clone()));

    let mut healthy = false;
    for _ in 0..50 {
        if reqwest::get(format!("http://{addr}/healthz")).await.is_ok() {
            healthy = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(healthy);

    token.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn receiver_accepts_reports_and_rejects_garbage() {
    let addr = spawn_server(create_receiver_router()).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/metrics");

    let ok = client
        .post(&url)
        .json(&json!({"agent_id": "id-1", "agent_name": "web-01", "timestamp": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);

    let bad = client.post(&url).body("not json").send().await.unwrap();
    assert_eq!(bad.status(), 400);
    let body: Value = bad.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn receiver_accepts_log_stream() {
    let addr = spawn_server(create_receiver_router()).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/logs")).await.unwrap();
    ws.send(Message::Text(r#"{"service":"system","message":"hello"}"#.into()))
        .await
        .unwrap();
    ws.close(None).await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(5), ws.next()).await.unwrap();
    assert!(
        matches!(reply, None | Some(Ok(Message::Close(_)))),
        "expected the close handshake to complete, got {reply:?}"
    );
}
