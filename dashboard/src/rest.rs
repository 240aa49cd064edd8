use crate::dashboard::SharedView;
use crate::metrics;
use crate::view::DashboardView;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::error;

#[derive(Debug, Clone)]
struct AppState {
    view: SharedView,
    refresh_secs: u64,
}

/// Routes serving the dashboard page, its JSON snapshot and metrics.
pub fn create_router(view: SharedView, refresh_secs: u64) -> Router {
    let state = AppState { view, refresh_secs };

    Router::new()
        .route("/", get(get_page))
        .route("/api/v1/dashboard", get(get_snapshot))
        .route("/metrics", get(get_metrics))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn get_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let page = state.view.read().await.render_html(state.refresh_secs)?;
    Ok(Html(page))
}

async fn get_snapshot(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.view.read().await.clone())
}

async fn get_metrics() -> Result<String, AppError> {
    Ok(metrics::gather_metrics()?)
}

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("API error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
