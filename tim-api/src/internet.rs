use axum::{extract::State, routing::{get, post}, Json, Router};
use tim_core::network::InternetStatus;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/internet", get(get_status))
        .route("/v1/internet/toggle", post(toggle))
}

/// GET /v1/internet
async fn get_status(State(state): State<AppState>) -> Json<InternetStatus> {
    Json(state.internet.status().await)
}

/// POST /v1/internet/toggle
/// Software override; holds until the physical switch moves
async fn toggle(State(state): State<AppState>) -> Result<Json<InternetStatus>, AppError> {
    Ok(Json(state.internet.toggle().await?))
}
