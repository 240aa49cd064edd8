use crate::config::DashboardConfig;
use crate::errors::FetchError;
use crate::metrics::FETCH_LATENCY_SECONDS;
use crate::model::{FeedResponse, TelemetrySample};
use std::future::Future;
use tokio::time::Instant;
use tracing::debug;

/// Produces the latest sample, or the reason it could not.
pub trait TelemetrySource: Send + Sync + 'static {
    fn fetch_latest(&self) -> impl Future<Output = Result<TelemetrySample, FetchError>> + Send;
}

/// Reads the most recent feed of one ThingSpeak channel.
#[derive(Debug, Clone)]
pub struct ThingSpeakClient {
    http: reqwest::Client,
    feeds_url: String,
    read_api_key: String,
}

impl ThingSpeakClient {
    pub fn new(config: &DashboardConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            feeds_url: config.feeds_url(),
            read_api_key: config.read_api_key.clone(),
        })
    }

    pub fn feeds_url(&self) -> &str {
        &self.feeds_url
    }

    async fn request(&self) -> Result<FeedResponse, FetchError> {
        let response = self
            .http
            .get(&self.feeds_url)
            .query(&[("api_key", self.read_api_key.as_str()), ("results", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        debug!("Received {} bytes from {}", body.len(), self.feeds_url);
        Ok(serde_json::from_slice::<FeedResponse>(&body)?)
    }
}

impl TelemetrySource for ThingSpeakClient {
    async fn fetch_latest(&self) -> Result<TelemetrySample, FetchError> {
        let start = Instant::now();
        let result = self.request().await;
        FETCH_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());

        TelemetrySample::try_from(result?)
    }
}
