use crate::logging::init_logging;
use color_eyre::Result;
use logtick_collector::build_collectors;
use logtick_config::AgentConfig;
use logtick_http::{
    create_receiver_router,
    create_router,
    serve,
    AppState,
};
use logtick_log_stream::{
    LogSender,
    LogSenderOptions,
};
use logtick_orchestrator::{
    AgentIdentity,
    HttpSink,
    Instrumentation,
    Orchestrator,
    ReportState,
};
use std::{
    net::SocketAddr,
    sync::Arc,
};
use tokio_util::sync::CancellationToken;

pub struct App {
    config: AgentConfig,
}

impl App {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Runs the agent until SIGINT/SIGTERM or until the HTTP server fails.
    pub async fn run(self) -> Result<()> {
        let config = self.config;
        let shutdown = CancellationToken::new();

        let log_sender = config.log_stream.enabled.then(|| {
            LogSender::spawn(
                LogSenderOptions {
                    url: config.log_stream.url.clone(),
                    reconnect_interval: config.log_stream.reconnect_interval(),
                    agent_id: config.agent_id.clone(),
                    agent_name: config.agent_name.clone(),
                },
                &shutdown,
            )
        });
        init_logging(&config.log_level, log_sender.clone())?;
        info!(agent_id = %config.agent_id, agent_name = %config.agent_name, "Starting agent");

        let identity = AgentIdentity {
            id: config.agent_id.clone(),
            name: config.agent_name.clone(),
        };
        let instrumentation = Arc::new(Instrumentation::new(identity.clone())?);
        let reports = Arc::new(ReportState::new(identity));

        let collectors = build_collectors(&config).await;
        for name in collectors.enabled_names() {
            instrumentation.register_collector(&name);
        }

        let router = create_router(
            AppState {
                reports: reports.clone(),
                instrumentation: instrumentation.clone(),
            },
            &config.http.static_dir,
        );
        let mut http = tokio::spawn(serve(config.http.listen_address, router, shutdown.clone()));

        let sink = Arc::new(HttpSink::new(&config.target_url)?);
        info!(target_url = %sink.target(), "Delivering reports");
        let orchestrator = Orchestrator::new(reports, sink, instrumentation).start(collectors.active, &shutdown);

        spawn_signal_handler(shutdown.clone());

        let http_result = tokio::select! {
            _ = shutdown.cancelled() => None,
            result = &mut http => {
                shutdown.cancel();
                Some(result)
            }
        };

        orchestrator.wait().await;
        if let Some(sender) = &log_sender {
            sender.shutdown();
            sender.wait().await;
        }
        let http_result = match http_result {
            Some(result) => result,
            None => http.await,
        };
        http_result??;

        info!("Agent stopped");
        Ok(())
    }
}

/// Runs the development receiver until SIGINT/SIGTERM.
pub async fn run_receiver(address: SocketAddr) -> Result<()> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());
    info!(%address, "Starting development receiver");
    serve(address, create_receiver_router(), shutdown).await
}

fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{
                signal,
                SignalKind,
            };
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C, shutting down"),
            _ = terminate => info!("Received SIGTERM, shutting down"),
            _ = token.cancelled() => return,
        }
        token.cancel();
    });
}
