use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{CatalogError, CatalogResult};
use crate::logic::{VariantUpdater, VariantsOutcome, VariantsView};
use crate::model::{Id, PropertyOwner, VariantsUpdate};
use crate::store::CatalogStore;

pub type AppState<S> = Arc<VariantUpdater<S>>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn update_body(
    payload: Result<Json<VariantsUpdate>, JsonRejection>,
) -> CatalogResult<VariantsUpdate> {
    payload
        .map(|Json(update)| update)
        .map_err(|rejection| CatalogError::Validation(rejection.body_text()))
}

pub async fn get_product_variants<S: CatalogStore>(
    State(updater): State<AppState<S>>,
    Path(product_id): Path<Id>,
) -> CatalogResult<Json<VariantsView>> {
    let view = updater
        .load(PropertyOwner::Product { product_id })
        .await?;
    Ok(Json(view))
}

pub async fn put_product_variants<S: CatalogStore>(
    State(updater): State<AppState<S>>,
    Path(product_id): Path<Id>,
    payload: Result<Json<VariantsUpdate>, JsonRejection>,
) -> CatalogResult<Json<VariantsOutcome>> {
    let update = update_body(payload)?;
    let outcome = updater
        .apply(PropertyOwner::Product { product_id }, update)
        .await?;
    Ok(Json(outcome))
}

pub async fn get_variation_variants<S: CatalogStore>(
    State(updater): State<AppState<S>>,
    Path((product_id, variation_id)): Path<(Id, Id)>,
) -> CatalogResult<Json<VariantsView>> {
    let view = updater
        .load(PropertyOwner::Variation {
            product_id,
            variation_id,
        })
        .await?;
    Ok(Json(view))
}

pub async fn put_variation_variants<S: CatalogStore>(
    State(updater): State<AppState<S>>,
    Path((product_id, variation_id)): Path<(Id, Id)>,
    payload: Result<Json<VariantsUpdate>, JsonRejection>,
) -> CatalogResult<Json<VariantsOutcome>> {
    let update = update_body(payload)?;
    let outcome = updater
        .apply(
            PropertyOwner::Variation {
                product_id,
                variation_id,
            },
            update,
        )
        .await?;
    Ok(Json(outcome))
}
