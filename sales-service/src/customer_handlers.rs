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
use crate::customers::{self, Customer, CustomerInput};
use crate::json::ValidJson;

pub async fn list_customers(
    Authorized(ctx, _): Authorized<gate::CustomerView>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let rows = customers::list(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn get_customer(
    Authorized(ctx, _): Authorized<gate::CustomerView>,
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<Customer>, ApiError> {
    let customer = customers::get(&state.db, customer_id)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(customer))
}

pub async fn create_customer(
    Authorized(ctx, _): Authorized<gate::CustomerWrite>,
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = customers::create(&state.db, input)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    info!(customer_id = customer.id, user_id = ctx.user_id, "customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    Authorized(ctx, _): Authorized<gate::CustomerWrite>,
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
    ValidJson(input): ValidJson<CustomerInput>,
) -> Result<Json<Customer>, ApiError> {
    let customer = customers::update(&state.db, customer_id, input)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    Authorized(ctx, _): Authorized<gate::CustomerWrite>,
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    customers::delete(&state.db, customer_id)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    info!(customer_id, user_id = ctx.user_id, "customer deleted");
    Ok(Json(json!({ "message": "Customer deleted" })))
}
