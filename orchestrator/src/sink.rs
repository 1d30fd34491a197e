use crate::report::ConsolidatedReport;
use eyre::Context as _;
use reqwest::{
    header::CONTENT_TYPE,
    Client as HttpClient,
    StatusCode,
};
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("Delivery target answered with status {0}")]
    Status(StatusCode),
    #[error("Delivery request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Failed to encode the report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound transport for consolidated reports. One attempt per report.
pub trait ReportSink: Send + Sync {
    fn deliver<'a>(
        &'a self,
        report: &'a ConsolidatedReport,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;
}

/// POSTs every report as JSON to the configured target.
pub struct HttpSink {
    http_client: HttpClient,
    target: Url,
}

impl HttpSink {
    pub fn new(target: &str) -> eyre::Result<Self> {
        let target = Url::parse(target).wrap_err_with(|| format!("Invalid target_url {target:?}"))?;
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("Failed to build HTTP client")?;
        Ok(Self { http_client, target })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }
}

impl ReportSink for HttpSink {
    fn deliver<'a>(
        &'a self,
        report: &'a ConsolidatedReport,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
        Box::pin(async move {
            let body = serde_json::to_vec(report)?;
            let response = self
                .http_client
                .post(self.target.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .map_err(DeliveryError::Transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(DeliveryError::Status(status));
            }
            Ok(())
        })
    }
}
