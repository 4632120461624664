use common_http_errors::ApiError;
use thiserror::Error;
use uuid::Uuid;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer,
    Product,
    Sale,
}

impl Entity {
    fn label(self) -> &'static str {
        match self {
            Entity::Customer => "Customer",
            Entity::Product => "Product",
            Entity::Sale => "Sale",
        }
    }

    fn not_found_code(self) -> &'static str {
        match self {
            Entity::Customer => "customer_not_found",
            Entity::Product => "product_not_found",
            Entity::Sale => "sale_not_found",
        }
    }

    fn in_use_code(self) -> &'static str {
        match self {
            Entity::Customer => "customer_in_use",
            Entity::Product => "product_in_use",
            Entity::Sale => "sale_in_use",
        }
    }
}

/// Failures surfaced by the repositories; handlers turn them into [`ApiError`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("{} {id} not found", entity.label())]
    NotFound { entity: Entity, id: i64 },
    #[error("{} {id} still has sales", entity.label())]
    InUse { entity: Entity, id: i64 },
    #[error("customer {0} does not exist")]
    InvalidCustomer(i64),
    #[error("product {0} does not exist")]
    InvalidProduct(i64),
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },
    #[error("email already registered")]
    DuplicateEmail,
    #[error("stored role '{0}' is not recognised")]
    CorruptRole(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation { code, message: message.into() }
    }

    pub fn into_api(self, trace_id: Uuid) -> ApiError {
        let trace = Some(trace_id);
        match self {
            StoreError::Validation { code, message } => ApiError::validation(code, message, trace),
            err @ StoreError::NotFound { entity, .. } => {
                ApiError::not_found(entity.not_found_code(), err.to_string(), trace)
            }
            err @ StoreError::InUse { entity, .. } => {
                ApiError::conflict(entity.in_use_code(), err.to_string(), trace)
            }
            StoreError::InvalidCustomer(_) => {
                ApiError::validation("invalid_customer", "Invalid customer", trace)
            }
            StoreError::InvalidProduct(_) => {
                ApiError::validation("invalid_product", "Invalid product", trace)
            }
            err @ StoreError::InsufficientStock { .. } => {
                ApiError::validation("insufficient_stock", err.to_string(), trace)
            }
            StoreError::DuplicateEmail => {
                ApiError::conflict("duplicate_email", "Email already exists", trace)
            }
            err @ (StoreError::CorruptRole(_) | StoreError::Database(_)) => {
                ApiError::internal(err, trace)
            }
        }
    }
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_code(err, UNIQUE_VIOLATION)
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_code(err, FOREIGN_KEY_VIOLATION)
}

pub(crate) fn is_check_violation(err: &sqlx::Error) -> bool {
    has_code(err, CHECK_VIOLATION)
}
