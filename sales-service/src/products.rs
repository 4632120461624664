use chrono::{DateTime, Utc};
use common_money::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{is_foreign_key_violation, Entity, StoreError, StoreResult};

/// Precision of `products.price`.
const PRICE_PRECISION: i64 = 12;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub price: Money,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: i32,
}

pub struct ValidProduct {
    pub name: String,
    pub category: Option<String>,
    pub price: Money,
    pub stock: i32,
}

impl ProductInput {
    pub fn validate(self) -> StoreResult<ValidProduct> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::validation("invalid_name", "Product name is required"));
        }
        let price = self
            .price
            .ok_or_else(|| StoreError::validation("invalid_price", "Product price is required"))?;
        if price.is_negative() {
            return Err(StoreError::validation("invalid_price", "Product price must not be negative"));
        }
        if !price.fits_precision(PRICE_PRECISION) {
            return Err(StoreError::validation("invalid_price", "Product price must be below 10000000000"));
        }
        if self.stock < 0 {
            return Err(StoreError::validation("invalid_stock", "Product stock must not be negative"));
        }
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(ValidProduct { name, category, price, stock: self.stock })
    }
}

const COLUMNS: &str = "id, name, category, price, stock, created_at";

pub async fn list(pool: &PgPool) -> StoreResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> StoreResult<Product> {
    sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound { entity: Entity::Product, id })
}

pub async fn create(pool: &PgPool, input: ProductInput) -> StoreResult<Product> {
    let valid = input.validate()?;
    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (name, category, price, stock) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(&valid.name)
    .bind(&valid.category)
    .bind(&valid.price)
    .bind(valid.stock)
    .fetch_one(pool)
    .await?;
    Ok(product)
}

pub async fn update(pool: &PgPool, id: i64, input: ProductInput) -> StoreResult<Product> {
    let valid = input.validate()?;
    sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET name = $1, category = $2, price = $3, stock = $4 WHERE id = $5 RETURNING {COLUMNS}"
    ))
    .bind(&valid.name)
    .bind(&valid.category)
    .bind(&valid.price)
    .bind(valid.stock)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound { entity: Entity::Product, id })
}

pub async fn delete(pool: &PgPool, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                StoreError::InUse { entity: Entity::Product, id }
            } else {
                StoreError::Database(err)
            }
        })?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity: Entity::Product, id });
    }
    Ok(())
}
