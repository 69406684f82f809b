use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tim_catalog::{ProductConfig, SoftwareAddon};
use tim_configurator::{suggest_upgrade, UpgradeSuggestion};
use tim_shared::Currency;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products", get(list_products))
        .route("/v1/products/{id}/addons", get(list_addons))
        .route("/v1/products/{id}/suggestion", get(get_suggestion))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: ProductConfig,
    pub currency: Currency,
    pub display_price: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/products?currency=GBP
/// Catalog prices stay in EUR; `displayPrice` is converted for display only
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let currency = match query.currency.as_deref() {
        Some(code) => code
            .parse::<Currency>()
            .map_err(|e| AppError::ValidationError(e.to_string()))?,
        None => Currency::default(),
    };

    let products = state
        .catalog
        .products()
        .iter()
        .map(|product| ProductResponse {
            display_price: currency.format(product.base_price),
            product: product.clone(),
            currency,
        })
        .collect();

    Ok(Json(products))
}

/// GET /v1/products/:id/addons
async fn list_addons(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<SoftwareAddon>>, AppError> {
    if state.catalog.product(&product_id).is_none() {
        return Err(AppError::NotFoundError(format!("Product not found: {}", product_id)));
    }

    let addons = state.catalog.addons_for(&product_id).into_iter().cloned().collect();
    Ok(Json(addons))
}

/// GET /v1/products/:id/suggestion
/// `null` when the product has no recommended replacement
async fn get_suggestion(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Option<UpgradeSuggestion>>, AppError> {
    if state.catalog.product(&product_id).is_none() {
        return Err(AppError::NotFoundError(format!("Product not found: {}", product_id)));
    }

    Ok(Json(suggest_upgrade(&state.catalog, &product_id)))
}
