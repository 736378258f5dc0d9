//! Merchant API endpoints - JSON API
//!
//! Writes run through the merchant mutations so cached merchant and
//! pattern reads are refreshed afterwards.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use txanalyzer_core::{CreateMerchant, Merchant, NormalizeMerchantRequest, NormalizeMerchantResponse, UpdateMerchant};
use txanalyzer_query::{
    CreateMerchantMutation, DeactivateMerchantMutation, MerchantUpdate, Mutation, UpdateMerchantMutation,
};

use crate::error::{WebError, WebResult};
use crate::AppState;

pub async fn api_create_merchant(
    State(state): State<AppState>,
    Json(data): Json<CreateMerchant>,
) -> WebResult<(StatusCode, Json<Merchant>)> {
    if data.normalized_name.trim().is_empty() {
        return Err(WebError::BadRequest {
            message: "normalizedName must not be empty".to_string(),
        });
    }
    let mutation = Mutation::new(CreateMerchantMutation::new(state.api().clone(), state.cache().clone()));
    let merchant = mutation.mutate(data).await?;
    Ok((StatusCode::CREATED, Json(merchant)))
}

pub async fn api_update_merchant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<UpdateMerchant>,
) -> WebResult<Json<Merchant>> {
    let mutation = Mutation::new(UpdateMerchantMutation::new(state.api().clone(), state.cache().clone()));
    let merchant = mutation.mutate(MerchantUpdate { id, data }).await?;
    Ok(Json(merchant))
}

pub async fn api_deactivate_merchant(State(state): State<AppState>, Path(id): Path<String>) -> WebResult<StatusCode> {
    let mutation = Mutation::new(DeactivateMerchantMutation::new(state.api().clone(), state.cache().clone()));
    mutation.mutate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Normalization preview; nothing is stored
pub async fn api_normalize_merchant(
    State(state): State<AppState>,
    Json(request): Json<NormalizeMerchantRequest>,
) -> WebResult<Json<NormalizeMerchantResponse>> {
    let response = state.api().normalize_merchant(&request).await?;
    Ok(Json(response))
}
