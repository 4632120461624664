use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use common_http_errors::ApiError;
use common_security::{gate, Authorized};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::products::{self, Product, ProductInput};
use crate::json::ValidJson;

pub async fn list_products(
    Authorized(ctx, _): Authorized<gate::ProductView>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let rows = products::list(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn get_product(
    Authorized(ctx, _): Authorized<gate::ProductView>,
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = products::get(&state.db, product_id)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(product))
}

pub async fn create_product(
    Authorized(ctx, _): Authorized<gate::ProductWrite>,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = products::create(&state.db, input)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    info!(product_id = product.id, user_id = ctx.user_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    Authorized(ctx, _): Authorized<gate::ProductWrite>,
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    ValidJson(input): ValidJson<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    let product = products::update(&state.db, product_id, input)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(product))
}

pub async fn delete_product(
    Authorized(ctx, _): Authorized<gate::ProductWrite>,
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    products::delete(&state.db, product_id)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    info!(product_id, user_id = ctx.user_id, "product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}
