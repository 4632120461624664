//! Read-only aggregates over stored sales for the admin dashboard.
//!
//! Revenue is always `SUM(sales.total)`, the price captured when each sale was
//! made. Time buckets are computed in UTC. Grouping and bucketing are chosen
//! from closed enums whose SQL fragments are fixed strings, so no request
//! input ever reaches the query text; the only bound values are the limit and
//! the daily window start.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use common_money::Money;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::StoreResult;

pub const DEFAULT_TOP_LIMIT: i64 = 5;
pub const MAX_TOP_LIMIT: i64 = 50;
pub const DAILY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Month,
    Day,
}

impl TimeBucket {
    fn pattern(self) -> &'static str {
        match self {
            TimeBucket::Month => "YYYY-MM",
            TimeBucket::Day => "YYYY-MM-DD",
        }
    }

    fn expr(self, column: &'static str) -> String {
        format!("to_char({column} AT TIME ZONE 'UTC', '{}')", self.pattern())
    }
}

/// Entities ranked by revenue for the top-N views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    Products,
    Customers,
}

impl Ranking {
    fn join(self) -> &'static str {
        match self {
            Ranking::Products => "JOIN products e ON e.id = s.product_id",
            Ranking::Customers => "JOIN customers e ON e.id = s.customer_id",
        }
    }
}

/// Free-text attributes sales revenue can be grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDimension {
    Category,
    Region,
}

impl GroupDimension {
    fn join(self) -> &'static str {
        match self {
            GroupDimension::Category => "JOIN products p ON p.id = s.product_id",
            GroupDimension::Region => "JOIN customers c ON c.id = s.customer_id",
        }
    }

    fn key(self) -> &'static str {
        match self {
            GroupDimension::Category => "p.category",
            GroupDimension::Region => "c.address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RankedEntity {
    pub id: i64,
    pub name: String,
    pub revenue: Money,
}

/// Top customer row; `total_spent` is the customer's revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomer {
    pub id: i64,
    pub name: String,
    pub total_spent: Money,
}

impl From<RankedEntity> for TopCustomer {
    fn from(value: RankedEntity) -> Self {
        TopCustomer { id: value.id, name: value.name, total_spent: value.revenue }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SalesCount {
    pub month: String,
    pub sales_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CategoryRevenue {
    pub category: Option<String>,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RegionRevenue {
    pub address: Option<String>,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DailyRevenue {
    pub day: String,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CustomerAcquisition {
    pub month: String,
    pub new_customers: i64,
}

pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT)
}

/// Inclusive lower bound of the daily trend: midnight UTC, 30 days before `today`.
pub fn daily_window_start(today: NaiveDate) -> DateTime<Utc> {
    (today - Duration::days(DAILY_WINDOW_DAYS))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn revenue_by_bucket_sql(bucket: TimeBucket, alias: &str, filter: &str) -> String {
    let bucket = bucket.expr("s.sale_date");
    format!(
        "SELECT {bucket} AS {alias}, SUM(s.total) AS revenue
         FROM sales s
         {filter}
         GROUP BY 1
         ORDER BY 1"
    )
}

fn count_by_bucket_sql(bucket: TimeBucket, table: &str, column: &'static str, alias: &str) -> String {
    let bucket = bucket.expr(column);
    format!("SELECT {bucket} AS month, COUNT(*) AS {alias} FROM {table} GROUP BY 1 ORDER BY 1")
}

fn ranking_sql(ranking: Ranking) -> String {
    format!(
        "SELECT e.id, e.name, SUM(s.total) AS revenue
         FROM sales s
         {join}
         GROUP BY e.id, e.name
         ORDER BY revenue DESC, e.id ASC
         LIMIT $1",
        join = ranking.join()
    )
}

fn grouped_sql(dimension: GroupDimension, alias: &str) -> String {
    let key = dimension.key();
    format!(
        "SELECT {key} AS {alias}, SUM(s.total) AS revenue
         FROM sales s
         {join}
         GROUP BY {key}
         ORDER BY revenue DESC, {key} ASC NULLS LAST",
        join = dimension.join()
    )
}

pub async fn monthly_revenue(pool: &PgPool) -> StoreResult<Vec<MonthlyRevenue>> {
    let rows = sqlx::query_as::<_, MonthlyRevenue>(&revenue_by_bucket_sql(TimeBucket::Month, "month", ""))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn top_ranked(pool: &PgPool, ranking: Ranking, limit: i64) -> StoreResult<Vec<RankedEntity>> {
    let rows = sqlx::query_as::<_, RankedEntity>(&ranking_sql(ranking))
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn top_products(pool: &PgPool, limit: i64) -> StoreResult<Vec<RankedEntity>> {
    top_ranked(pool, Ranking::Products, limit).await
}

pub async fn top_customers(pool: &PgPool, limit: i64) -> StoreResult<Vec<TopCustomer>> {
    let rows = top_ranked(pool, Ranking::Customers, limit).await?;
    Ok(rows.into_iter().map(TopCustomer::from).collect())
}

pub async fn sales_growth(pool: &PgPool) -> StoreResult<Vec<SalesCount>> {
    let sql = count_by_bucket_sql(TimeBucket::Month, "sales s", "s.sale_date", "sales_count");
    let rows = sqlx::query_as::<_, SalesCount>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn sales_by_category(pool: &PgPool) -> StoreResult<Vec<CategoryRevenue>> {
    let rows = sqlx::query_as::<_, CategoryRevenue>(&grouped_sql(GroupDimension::Category, "category"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn sales_by_region(pool: &PgPool) -> StoreResult<Vec<RegionRevenue>> {
    let rows = sqlx::query_as::<_, RegionRevenue>(&grouped_sql(GroupDimension::Region, "address"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn daily_sales(pool: &PgPool, today: NaiveDate) -> StoreResult<Vec<DailyRevenue>> {
    let sql = revenue_by_bucket_sql(TimeBucket::Day, "day", "WHERE s.sale_date >= $1");
    let rows = sqlx::query_as::<_, DailyRevenue>(&sql)
        .bind(daily_window_start(today))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn customer_acquisition(pool: &PgPool) -> StoreResult<Vec<CustomerAcquisition>> {
    let sql = count_by_bucket_sql(TimeBucket::Month, "customers c", "c.created_at", "new_customers");
    let rows = sqlx::query_as::<_, CustomerAcquisition>(&sql).fetch_all(pool).await?;
    Ok(rows)
}
