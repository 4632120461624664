use chrono::{DateTime, Utc};
use common_money::{line_total, Money};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use crate::error::{is_check_violation, is_foreign_key_violation, Entity, StoreError, StoreResult};

/// Sale row joined with the names a listing shows.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleView {
    pub id: i64,
    pub customer_id: i64,
    pub customer: String,
    pub product_id: i64,
    pub product: String,
    pub quantity: i32,
    pub total: Money,
    pub sale_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub total: Money,
    pub sale_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Defaults to the creation instant.
    #[serde(default)]
    pub sale_date: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct StockRow {
    price: Money,
    stock: i32,
}

const VIEW_SELECT: &str = "SELECT s.id, s.customer_id, c.name AS customer, s.product_id, p.name AS product,
        s.quantity, s.total, s.sale_date, s.created_at
     FROM sales s
     JOIN customers c ON c.id = s.customer_id
     JOIN products p ON p.id = s.product_id";

pub async fn list(pool: &PgPool) -> StoreResult<Vec<SaleView>> {
    let rows = sqlx::query_as::<_, SaleView>(&format!("{VIEW_SELECT} ORDER BY s.sale_date DESC, s.id DESC"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> StoreResult<SaleView> {
    sqlx::query_as::<_, SaleView>(&format!("{VIEW_SELECT} WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound { entity: Entity::Sale, id })
}

/// Records a sale and takes its quantity out of stock in one transaction.
///
/// The customer row is held `FOR KEY SHARE` so it cannot be deleted before the
/// sale row references it. The product row is locked with `FOR UPDATE`, so
/// concurrent sales of the same product serialize on it and the stock check
/// cannot be raced. Any early return drops `tx`, which rolls back everything
/// done so far.
pub async fn create(pool: &PgPool, new_sale: NewSale) -> StoreResult<Sale> {
    if new_sale.quantity <= 0 {
        return Err(StoreError::validation("invalid_quantity", "Quantity must be greater than zero"));
    }

    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM customers WHERE id = $1 FOR KEY SHARE")
        .bind(new_sale.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::InvalidCustomer(new_sale.customer_id))?;

    let product = sqlx::query_as::<_, StockRow>("SELECT price, stock FROM products WHERE id = $1 FOR UPDATE")
        .bind(new_sale.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::InvalidProduct(new_sale.product_id))?;

    if new_sale.quantity > product.stock {
        debug!(
            product_id = new_sale.product_id,
            requested = new_sale.quantity,
            available = product.stock,
            "sale rejected for insufficient stock"
        );
        return Err(StoreError::InsufficientStock {
            requested: new_sale.quantity,
            available: product.stock,
        });
    }

    let total = line_total(&product.price, new_sale.quantity);
    let sale_date = new_sale.sale_date.unwrap_or_else(Utc::now);

    let sale = sqlx::query_as::<_, Sale>(
        "INSERT INTO sales (customer_id, product_id, quantity, total, sale_date)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, customer_id, product_id, quantity, total, sale_date, created_at",
    )
    .bind(new_sale.customer_id)
    .bind(new_sale.product_id)
    .bind(new_sale.quantity)
    .bind(&total)
    .bind(sale_date)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        // Unreachable while both parent rows are locked above.
        if is_foreign_key_violation(&err) {
            StoreError::InvalidCustomer(new_sale.customer_id)
        } else {
            StoreError::Database(err)
        }
    })?;

    sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
        .bind(new_sale.quantity)
        .bind(new_sale.product_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            if is_check_violation(&err) {
                StoreError::InsufficientStock {
                    requested: new_sale.quantity,
                    available: product.stock,
                }
            } else {
                StoreError::Database(err)
            }
        })?;

    tx.commit().await?;
    info!(sale_id = sale.id, product_id = sale.product_id, quantity = sale.quantity, total = %sale.total, "sale recorded");
    Ok(sale)
}

/// Removes the sale row only; stock is not returned to the product.
pub async fn delete(pool: &PgPool, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM sales WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity: Entity::Sale, id });
    }
    Ok(())
}
