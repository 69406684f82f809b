use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tim_catalog::{ConfigurationState, PriceBreakdown};
use tim_configurator::{ConfigurationError, ConfigurationPricingEngine, ConfigurationUpdate};
use tim_shared::models::events::ConfigurationPricedEvent;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{with_engine, AppState, SessionEngine};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(open_session))
        .route(
            "/v1/sessions/{id}/configuration",
            get(get_configuration)
                .put(select_product)
                .patch(update_configuration)
                .delete(clear_configuration),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    /// Resume a previous session's persisted configuration
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectProductRequest {
    pub product_id: String,
    /// Carry compatible add-ons over to the new product
    #[serde(default)]
    pub keep_software: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationResponse {
    pub session_id: Uuid,
    pub configuration: Option<ConfigurationState>,
    pub breakdown: Option<PriceBreakdown>,
    pub total_price: u32,
}

impl ConfigurationResponse {
    fn from_engine(session_id: Uuid, engine: &ConfigurationPricingEngine) -> Self {
        Self {
            session_id,
            configuration: engine.configuration().cloned(),
            breakdown: engine.breakdown(),
            total_price: engine.calculate_total(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/sessions
/// Open a new session, or resume `sessionId` from persisted state
async fn open_session(
    State(state): State<AppState>,
    body: Option<Json<OpenSessionRequest>>,
) -> Result<(StatusCode, Json<ConfigurationResponse>), AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let session_id = req.session_id.unwrap_or_else(Uuid::new_v4);

    let engine = state.open_session(session_id).await?;
    let engine = engine.lock().await;
    info!(
        "Session {} opened (restored: {})",
        session_id,
        engine.configuration().is_some()
    );

    Ok((
        StatusCode::CREATED,
        Json(ConfigurationResponse::from_engine(session_id, &engine)),
    ))
}

/// GET /v1/sessions/:id/configuration
async fn get_configuration(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConfigurationResponse>, AppError> {
    let engine = find_session(&state, session_id).await?;
    let engine = engine.lock().await;
    Ok(Json(ConfigurationResponse::from_engine(session_id, &engine)))
}

/// PUT /v1/sessions/:id/configuration
async fn select_product(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SelectProductRequest>,
) -> Result<Json<ConfigurationResponse>, AppError> {
    let engine = find_session(&state, session_id).await?;

    let response = with_engine(engine, move |engine| {
        if req.keep_software {
            engine.switch_product(&req.product_id)?;
        } else {
            engine.select_product(&req.product_id)?;
        }
        Ok::<_, ConfigurationError>(ConfigurationResponse::from_engine(session_id, engine))
    })
    .await??;

    publish_priced(&state, &response);
    Ok(Json(response))
}

/// PATCH /v1/sessions/:id/configuration
async fn update_configuration(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(update): Json<ConfigurationUpdate>,
) -> Result<Json<ConfigurationResponse>, AppError> {
    let engine = find_session(&state, session_id).await?;

    let response = with_engine(engine, move |engine| {
        engine.update_configuration(update)?;
        Ok::<_, ConfigurationError>(ConfigurationResponse::from_engine(session_id, engine))
    })
    .await??;

    publish_priced(&state, &response);
    Ok(Json(response))
}

/// DELETE /v1/sessions/:id/configuration
async fn clear_configuration(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let engine = find_session(&state, session_id).await?;
    with_engine(engine, |engine| engine.clear_configuration()).await?;
    debug!("Session {} configuration cleared", session_id);
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_session(state: &AppState, session_id: Uuid) -> Result<SessionEngine, AppError> {
    state
        .session(session_id)
        .await
        .ok_or_else(|| AppError::NotFoundError(format!("Session not found: {}", session_id)))
}

fn publish_priced(state: &AppState, response: &ConfigurationResponse) {
    // No subscribers is fine
    let _ = state.priced_tx.send(ConfigurationPricedEvent {
        session_id: response.session_id,
        product_id: response.configuration.as_ref().map(|c| c.product_id().to_string()),
        total_price: response.total_price,
        timestamp: Utc::now().timestamp(),
    });
}
