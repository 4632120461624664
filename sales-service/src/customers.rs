use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{is_foreign_key_violation, Entity, StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of create and full-replacement update.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerInput {
    pub fn validate(self) -> StoreResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::validation("invalid_name", "Customer name is required"));
        }
        Ok(Self {
            name,
            email: trimmed(self.email),
            phone: trimmed(self.phone),
            address: trimmed(self.address),
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

const COLUMNS: &str = "id, name, email, phone, address, created_at";

pub async fn list(pool: &PgPool) -> StoreResult<Vec<Customer>> {
    let rows = sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: i64) -> StoreResult<Customer> {
    sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound { entity: Entity::Customer, id })
}

pub async fn create(pool: &PgPool, input: CustomerInput) -> StoreResult<Customer> {
    let input = input.validate()?;
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "INSERT INTO customers (name, email, phone, address) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.address)
    .fetch_one(pool)
    .await?;
    Ok(customer)
}

pub async fn update(pool: &PgPool, id: i64, input: CustomerInput) -> StoreResult<Customer> {
    let input = input.validate()?;
    sqlx::query_as::<_, Customer>(&format!(
        "UPDATE customers SET name = $1, email = $2, phone = $3, address = $4 WHERE id = $5 RETURNING {COLUMNS}"
    ))
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.address)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound { entity: Entity::Customer, id })
}

pub async fn delete(pool: &PgPool, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                StoreError::InUse { entity: Entity::Customer, id }
            } else {
                StoreError::Database(err)
            }
        })?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { entity: Entity::Customer, id });
    }
    Ok(())
}
