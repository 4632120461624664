//! Admin-only dashboard aggregates under `/api/stats`.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use common_http_errors::ApiError;
use common_security::{gate, Authorized};
use serde::Deserialize;

use crate::analytics::{
    self, CategoryRevenue, CustomerAcquisition, DailyRevenue, MonthlyRevenue, RankedEntity, RegionRevenue,
    SalesCount, TopCustomer,
};
use crate::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<i64>,
}

type Stats<T> = Result<Json<Vec<T>>, ApiError>;

pub async fn monthly_revenue(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
) -> Stats<MonthlyRevenue> {
    let rows = analytics::monthly_revenue(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn top_products(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Stats<RankedEntity> {
    let rows = analytics::top_products(&state.db, analytics::clamp_limit(query.limit))
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn top_customers(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Stats<TopCustomer> {
    let rows = analytics::top_customers(&state.db, analytics::clamp_limit(query.limit))
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn sales_growth(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
) -> Stats<SalesCount> {
    let rows = analytics::sales_growth(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn sales_by_category(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
) -> Stats<CategoryRevenue> {
    let rows = analytics::sales_by_category(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn sales_by_region(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
) -> Stats<RegionRevenue> {
    let rows = analytics::sales_by_region(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn daily_sales(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
) -> Stats<DailyRevenue> {
    let today = Utc::now().date_naive();
    let rows = analytics::daily_sales(&state.db, today)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}

pub async fn customer_acquisition(
    Authorized(ctx, _): Authorized<gate::StatsView>,
    State(state): State<AppState>,
) -> Stats<CustomerAcquisition> {
    let rows = analytics::customer_acquisition(&state.db)
        .await
        .map_err(|err| err.into_api(ctx.trace_id))?;
    Ok(Json(rows))
}
