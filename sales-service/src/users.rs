use chrono::{DateTime, Utc};
use common_auth::Role;
use sqlx::{FromRow, PgPool};

use crate::error::{is_unique_violation, StoreError, StoreResult};

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    // Rows written before role names were canonical may hold "1"/"2" or mixed case.
    fn try_from(row: UserRow) -> StoreResult<Self> {
        let role = Role::normalize(&row.role).ok_or_else(|| StoreError::CorruptRole(row.role.clone()))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

/// Emails compare case-insensitively and are stored trimmed and lowercased.
pub fn canonical_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> StoreResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, role, created_at FROM users WHERE lower(email) = $1",
    )
    .bind(canonical_email(email))
    .fetch_optional(pool)
    .await?;
    row.map(User::try_from).transpose()
}

pub async fn email_exists(pool: &PgPool, email: &str) -> StoreResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = $1)",
    )
    .bind(canonical_email(email))
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn insert(pool: &PgPool, new_user: NewUser<'_>) -> StoreResult<User> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (name, email, password_hash, role)
         VALUES ($1, $2, $3, $4)
         RETURNING id, name, email, password_hash, role, created_at",
    )
    .bind(new_user.name.trim())
    .bind(canonical_email(new_user.email))
    .bind(new_user.password_hash)
    .bind(new_user.role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            StoreError::DuplicateEmail
        } else {
            StoreError::Database(err)
        }
    })?;
    User::try_from(row)
}
