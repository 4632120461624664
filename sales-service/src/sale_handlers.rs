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
use crate::error::StoreError;
use crate::json::ValidJson;
use crate::sales::{self, NewSale, Sale, SaleView};

fn sale_outcome(err: &StoreError) -> &'static str {
    match err {
        StoreError::InsufficientStock { .. } => "insufficient_stock",
        StoreError::Validation { .. } | StoreError::InvalidCustomer(_) | StoreError::InvalidProduct(_) => "invalid",
        _ => "error",
    }
}

pub async fn list_sales(
    Authorized(ctx, _): Authorized<gate::SaleView>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SaleView>>, ApiError> {
    let rows = sales::list(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn get_sale(
    Authorized(ctx, _): Authorized<gate::SaleView>,
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
) -> Result<Json<SaleView>, ApiError> {
    let sale = sales::get(&state.db, sale_id)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(sale))
}

pub async fn create_sale(
    Authorized(ctx, _): Authorized<gate::SaleWrite>,
    State(state): State<AppState>,
    ValidJson(new_sale): ValidJson<NewSale>,
) -> Result<(StatusCode, Json<Sale>), ApiError> {
    match sales::create(&state.db, new_sale).await {
        Ok(sale) => {
            state.metrics.sale_created("success");
            info!(sale_id = sale.id, user_id = ctx.user_id, trace_id = %ctx.trace_id, "sale created");
            Ok((StatusCode::CREATED, Json(sale)))
        }
        Err(err) => {
            state.metrics.sale_created(sale_outcome(&err));
            Err(err.into_api(ctx.trace_id))
        }
    }
}

pub async fn delete_sale(
    Authorized(ctx, _): Authorized<gate::SaleWrite>,
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    sales::delete(&state.db, sale_id)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    info!(sale_id, user_id = ctx.user_id, "sale deleted");
    Ok(Json(json!({ "message": "Sale deleted" })))
}
