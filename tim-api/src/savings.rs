use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tim_catalog::{LifetimeSavings, ModelRecommendation, SavingsCalculation, TimModel};

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_YEARS: u32 = 5;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/savings", post(compare_savings))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsRequest {
    /// Defaults to the recommended model for `storage_needed`
    pub model: Option<TimModel>,
    /// GB
    pub storage_needed: u32,
    pub years: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsResponse {
    pub model: TimModel,
    pub recommendation: ModelRecommendation,
    pub savings: Vec<SavingsCalculation>,
    pub lifetime: Vec<LifetimeSavings>,
    pub years: u32,
}

/// POST /v1/savings
async fn compare_savings(
    State(state): State<AppState>,
    Json(req): Json<SavingsRequest>,
) -> Result<Json<SavingsResponse>, AppError> {
    if req.storage_needed == 0 {
        return Err(AppError::ValidationError("storageNeeded must be greater than 0".to_string()));
    }
    let years = req.years.unwrap_or(DEFAULT_YEARS);
    if years == 0 {
        return Err(AppError::ValidationError("years must be greater than 0".to_string()));
    }

    let recommendation = state.savings.recommend_model(req.storage_needed);
    let model = req.model.unwrap_or(recommendation.model);

    Ok(Json(SavingsResponse {
        savings: state.savings.calculate_savings(model, req.storage_needed),
        lifetime: state.savings.lifetime_savings(model, req.storage_needed, years),
        model,
        recommendation,
        years,
    }))
}
