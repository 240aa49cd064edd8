use crate::errors::ConfigError;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_SOIL_MOISTURE_MIN: f64 = 30.0;
pub const DEFAULT_TEMPERATURE_MAX: f64 = 35.0;

/// Command line for the dashboard binary. Every flag falls back to an
/// environment variable.
#[derive(Debug, Parser)]
#[command(name = "dashboard", about = "Polls a ThingSpeak channel and serves a sensor dashboard")]
pub struct Args {
    #[arg(long, env = "THINGSPEAK_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: String,

    #[arg(long, env = "READ_API_KEY", hide_env_values = true)]
    pub read_api_key: String,

    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// No timeout unless set; a hung request is only abandoned by the transport.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, env = "SOIL_MOISTURE_MIN", default_value_t = DEFAULT_SOIL_MOISTURE_MIN)]
    pub soil_moisture_min: f64,

    #[arg(long, env = "TEMPERATURE_MAX", default_value_t = DEFAULT_TEMPERATURE_MAX)]
    pub temperature_max: f64,

    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub base_url: String,
    pub channel_id: String,
    pub read_api_key: String,
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
    pub soil_moisture_min: f64,
    pub temperature_max: f64,
    pub http_addr: SocketAddr,
}

impl DashboardConfig {
    /// Config with production defaults for everything but the channel credentials.
    pub fn new(channel_id: impl Into<String>, read_api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            channel_id: channel_id.into(),
            read_api_key: read_api_key.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: None,
            soil_moisture_min: DEFAULT_SOIL_MOISTURE_MIN,
            temperature_max: DEFAULT_TEMPERATURE_MAX,
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_id.trim().is_empty() {
            return Err(ConfigError::Empty("CHANNEL_ID"));
        }
        if self.read_api_key.trim().is_empty() {
            return Err(ConfigError::Empty("READ_API_KEY"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if !self.soil_moisture_min.is_finite() {
            return Err(ConfigError::Threshold {
                name: "SOIL_MOISTURE_MIN",
            });
        }
        if !self.temperature_max.is_finite() {
            return Err(ConfigError::Threshold {
                name: "TEMPERATURE_MAX",
            });
        }

        match reqwest::Url::parse(&self.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
            Ok(url) => Err(ConfigError::BaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            }),
            Err(e) => Err(ConfigError::BaseUrl {
                url: self.base_url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Endpoint returning the channel's feeds. `api_key` and `results` are
    /// attached as query parameters by the client.
    pub fn feeds_url(&self) -> String {
        format!(
            "{}/channels/{}/feeds.json",
            self.base_url.trim_end_matches('/'),
            self.channel_id.trim()
        )
    }
}

impl TryFrom<Args> for DashboardConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let config = Self {
            base_url: args.base_url,
            channel_id: args.channel_id,
            read_api_key: args.read_api_key,
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            request_timeout: args.request_timeout_secs.map(Duration::from_secs),
            soil_moisture_min: args.soil_moisture_min,
            temperature_max: args.temperature_max,
            http_addr: args.http_addr,
        };
        config.validate()?;
        Ok(config)
    }
}
