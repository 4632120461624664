use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("'{0}' is not a decimal amount")]
    Unparseable(String),
}

/// Round a monetary value half-up to 2 decimal places, always carrying scale 2.
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}

/// `price × quantity`, normalized. This is the stored total of a sale line.
pub fn line_total(price: &Money, quantity: i32) -> Money {
    Money::new(&price.0 * BigDecimal::from(quantity))
}

/// Decimal amount with two fractional digits. Stored as `NUMERIC(12,2)` and
/// rendered in JSON as a number (`30.0`, `12.5`), not a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Money(BigDecimal);

impl Money {
    pub fn new(raw: BigDecimal) -> Self {
        Self(normalize_scale(&raw))
    }

    pub fn from_cents(cents: i64) -> Self {
        Self::new(BigDecimal::new(cents.into(), 2))
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::zero()
    }

    /// Whether the amount fits a `NUMERIC(precision, 2)` column.
    pub fn fits_precision(&self, precision: i64) -> bool {
        let limit = BigDecimal::new(1.into(), 2 - precision);
        self.0.abs() < limit
    }
}

impl From<BigDecimal> for Money {
    fn from(value: BigDecimal) -> Self {
        Self::new(value)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        BigDecimal::from_str(trimmed)
            .map(Money::new)
            .map_err(|_| MoneyError::Unparseable(trimmed.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .0
            .to_f64()
            .ok_or_else(|| S::Error::custom(format!("amount {} out of range", self.0)))?;
        serializer.serialize_f64(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyRepr {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Numbers go through their decimal text so 19.99 does not pick up binary float noise.
        let text = match MoneyRepr::deserialize(deserializer)? {
            MoneyRepr::Number(number) => number.to_string(),
            MoneyRepr::Text(text) => text,
        };
        text.parse().map_err(D::Error::custom)
    }
}
