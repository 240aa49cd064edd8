use clap::Parser;
use dashboard::client::ThingSpeakClient;
use dashboard::config::{Args, DashboardConfig};
use dashboard::dashboard::SensorDashboardClient;
use dashboard::errors::Result;
use dashboard::metrics;
use dashboard::poller::Poller;
use dashboard::rest;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = DashboardConfig::try_from(args)?;

    info!("Starting sensor dashboard");
    info!("Channel: {}", config.channel_id);
    info!("Feed endpoint: {}", config.feeds_url());
    info!(
        "Poll interval: {:?}, thresholds: soil moisture < {}%, temperature > {}°C",
        config.poll_interval, config.soil_moisture_min, config.temperature_max
    );

    // Initialize metrics
    metrics::init_metrics()?;

    // Build the telemetry client and the shared view
    let source = ThingSpeakClient::new(&config)?;
    let client = Arc::new(SensorDashboardClient::new(source, &config));

    // Bind the dashboard page before the first poll
    let app = rest::create_router(client.view(), config.poll_interval.as_secs());
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!("HTTP server listening on {}", config.http_addr);

    // First cycle runs immediately
    let poller = Poller::start(Arc::clone(&client), config.poll_interval);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    tokio::select! {
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    // Stop polling; an in-flight fetch is dropped
    let cycles = poller.stop().await;
    info!("Shutting down after {} poll cycles", cycles);
    Ok(())
}
