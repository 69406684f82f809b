use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tim_core::checkout::{Address, OrderStatus};
use tim_shared::models::events::CheckoutStartedEvent;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::sessions::find_session;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{id}/checkout", post(start_checkout))
        .route("/v1/checkout/verify/{session_id}", get(verify_payment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCheckoutRequest {
    pub shipping_address: Address,
    /// Defaults to the shipping address
    pub billing_address: Option<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub url: String,
    pub order_id: String,
    pub amount_cents: u64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub total_amount: u64,
    pub currency: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/sessions/:id/checkout
/// Reprices the session's configuration and hands it to the payment backend
async fn start_checkout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<StartCheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let engine = find_session(&state, session_id).await?;
    let configuration = engine.lock().await.configuration().cloned();

    let billing_address = req.billing_address.unwrap_or_else(|| req.shipping_address.clone());
    let order = state
        .checkout
        .start_checkout(configuration.as_ref(), req.shipping_address, billing_address)
        .await?;

    let response = CheckoutResponse {
        url: order.checkout_url.clone(),
        order_id: order.id.clone(),
        amount_cents: order.amount_cents,
        currency: order.currency.clone(),
    };

    let _ = state.checkout_tx.send(CheckoutStartedEvent {
        session_id,
        order_id: order.id.clone(),
        amount_cents: order.amount_cents,
        timestamp: Utc::now().timestamp(),
    });

    info!("Order {} pending for session {}", order.id, session_id);
    state.orders.lock().await.record(order);

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /v1/checkout/verify/:session_id
async fn verify_payment(
    State(state): State<AppState>,
    Path(checkout_session_id): Path<String>,
) -> Result<Json<VerifyResponse>, AppError> {
    let verification = state.checkout.verify_payment(&checkout_session_id).await?;

    {
        let mut orders = state.orders.lock().await;
        if orders.get(&verification.order_id).is_some() {
            orders.apply_status(&verification.order_id, verification.status.clone())?;
        } else {
            warn!("Verified order {} was not started by this process", verification.order_id);
        }
    }

    Ok(Json(VerifyResponse {
        order_id: verification.order_id,
        status: verification.status,
        total_amount: verification.total_amount,
        currency: verification.currency,
    }))
}
