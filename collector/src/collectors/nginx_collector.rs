use crate::{
    collectors::{
        Collector,
        Sample,
    },
    metrics::NginxData,
};
use eyre::{
    bail,
    Context as _,
    Result,
};
use logtick_config::NginxConfig;
use reqwest::{
    Client as HttpClient,
    StatusCode,
};
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Samples the nginx `stub_status` page.
pub struct NginxCollector {
    http_client: HttpClient,
    url: Url,
    interval: Duration,
}

impl NginxCollector {
    pub const NAME: &'static str = "nginx";

    pub fn new(config: &NginxConfig) -> Result<Self> {
        if config.stub_status_url.trim().is_empty() {
            bail!("nginx stub_status_url cannot be empty");
        }
        let url = Url::parse(&config.stub_status_url)
            .wrap_err_with(|| format!("Invalid stub_status_url {:?}", config.stub_status_url))?;
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            url,
            interval: config.interval(),
        })
    }

    async fn read(&self) -> Result<NginxData> {
        let response = self
            .http_client
            .get(self.url.clone())
            .send()
            .await
            .wrap_err_with(|| format!("Failed to fetch {}", self.url))?;

        let status = response.status();
        if status != StatusCode::OK {
            bail!("stub_status returned {status}");
        }

        let body = response.text().await.wrap_err("Failed to read stub_status body")?;
        NginxData::parse(&body)
    }
}

impl Collector for NginxCollector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self) -> Pin<Box<dyn Future<Output = Result<Sample>> + Send + '_>> {
        Box::pin(async move {
            let data = self.read().await?;
            Sample::new(&data)
        })
    }
}
