mod telemetry;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use telemetry::{generate_feed, Channel, FeedsBody};
use tracing::{debug, error, info, warn};

const MAX_RESULTS: usize = 100;
const FEED_SPACING_SECS: i64 = 15;

/// Local stand-in for a ThingSpeak channel serving random sensor readings.
#[derive(Debug, Parser)]
#[command(name = "simulator")]
struct Args {
    #[arg(long, env = "SIM_ADDR", default_value = "127.0.0.1:9000")]
    addr: SocketAddr,

    #[arg(long, env = "CHANNEL_ID", default_value_t = 1)]
    channel_id: u64,

    #[arg(long, env = "READ_API_KEY", default_value = "SIMULATOR")]
    api_key: String,

    /// Chance that soil moisture or temperature is generated outside its normal range
    #[arg(long, env = "OUTLIER_RATE", default_value_t = 0.1)]
    outlier_rate: f64,
}

struct AppState {
    channel_id: u64,
    api_key: String,
    outlier_rate: f64,
    last_entry_id: AtomicU64,
}

#[derive(Debug, Default, Deserialize)]
struct FeedsQuery {
    api_key: Option<String>,
    results: Option<usize>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.outlier_rate) {
        error!("OUTLIER_RATE must be between 0 and 1, got {}", args.outlier_rate);
        std::process::exit(1);
    }

    info!("Starting telemetry simulator");
    info!(
        "Channel: {}, outlier rate: {}, listening on {}",
        args.channel_id, args.outlier_rate, args.addr
    );

    let state = Arc::new(AppState {
        channel_id: args.channel_id,
        api_key: args.api_key,
        outlier_rate: args.outlier_rate,
        last_entry_id: AtomicU64::new(0),
    });

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", args.addr, e);
            std::process::exit(1);
        });

    tokio::select! {
        result = axum::serve(listener, create_router(state)) => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/channels/:channel_id/feeds.json", get(get_feeds))
        .with_state(state)
}

async fn get_feeds(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(params): Query<FeedsQuery>,
) -> Result<Json<FeedsBody>, (StatusCode, String)> {
    if channel_id.parse::<u64>().ok() != Some(state.channel_id) {
        warn!("Request for unknown channel {}", channel_id);
        return Err((StatusCode::NOT_FOUND, "-1".to_string()));
    }

    if params.api_key.as_deref() != Some(state.api_key.as_str()) {
        warn!("Rejected request with invalid read key");
        return Err((
            StatusCode::UNAUTHORIZED,
            r#"{"status":"401","error":{"error_code":"error_auth_required","message":"Authorization Required"}}"#
                .to_string(),
        ));
    }

    let results = params.results.unwrap_or(1).clamp(1, MAX_RESULTS);
    let newest = state.last_entry_id.fetch_add(1, Ordering::SeqCst) + 1;
    let now = Utc::now();

    let mut rng = rand::thread_rng();
    let feeds = (0..results as u64)
        .take_while(|i| *i < newest)
        .map(|i| {
            let created_at = now - ChronoDuration::seconds(FEED_SPACING_SECS * i as i64);
            generate_feed(&mut rng, newest - i, created_at, state.outlier_rate)
        })
        .collect::<Vec<_>>();

    debug!("Serving {} feeds, newest entry {}", feeds.len(), newest);

    Ok(Json(FeedsBody {
        channel: Channel::new(state.channel_id, newest),
        feeds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            channel_id: 42,
            api_key: "KEY".to_string(),
            outlier_rate: 0.0,
            last_entry_id: AtomicU64::new(0),
        })
    }

    fn query(api_key: &str, results: Option<usize>) -> FeedsQuery {
        FeedsQuery {
            api_key: Some(api_key.to_string()),
            results,
        }
    }

    #[test]
    fn test_latest_feed() {
        tokio_test::block_on(async {
            let state = state();
            let Json(body) = get_feeds(
                State(Arc::clone(&state)),
                Path("42".to_string()),
                Query(query("KEY", Some(1))),
            )
            .await
            .unwrap();

            assert_eq!(body.feeds.len(), 1);
            assert_eq!(body.feeds[0].entry_id, 1);
            assert_eq!(body.channel.last_entry_id, 1);
            assert!(body.feeds[0].field1.parse::<f64>().is_ok());
        });
    }

    #[test]
    fn test_entries_advance_and_newest_first() {
        tokio_test::block_on(async {
            let state = state();
            for _ in 0..4 {
                get_feeds(State(Arc::clone(&state)), Path("42".into()), Query(query("KEY", None)))
                    .await
                    .unwrap();
            }

            let Json(body) = get_feeds(
                State(Arc::clone(&state)),
                Path("42".into()),
                Query(query("KEY", Some(3))),
            )
            .await
            .unwrap();

            let ids: Vec<u64> = body.feeds.iter().map(|f| f.entry_id).collect();
            assert_eq!(ids, vec![5, 4, 3]);
            assert!(body.feeds[0].created_at > body.feeds[1].created_at);
        });
    }

    #[test]
    fn test_unknown_channel() {
        tokio_test::block_on(async {
            let err = get_feeds(State(state()), Path("7".into()), Query(query("KEY", None)))
                .await
                .unwrap_err();
            assert_eq!(err.0, StatusCode::NOT_FOUND);
        });
    }

    #[test]
    fn test_wrong_key() {
        tokio_test::block_on(async {
            let err = get_feeds(State(state()), Path("42".into()), Query(query("nope", None)))
                .await
                .unwrap_err();
            assert_eq!(err.0, StatusCode::UNAUTHORIZED);

            let err = get_feeds(State(state()), Path("42".into()), Query(FeedsQuery::default()))
                .await
                .unwrap_err();
            assert_eq!(err.0, StatusCode::UNAUTHORIZED);
        });
    }
}
