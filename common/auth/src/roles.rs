use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AuthError;

/// Canonical role carried in session tokens and security contexts.
///
/// Older user rows and clients express roles as numeric codes (1 = admin,
/// 2 = employee) or as names in arbitrary case; [`Role::normalize`] folds all
/// of these into the enum at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Employee];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Role::Admin),
            2 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::normalize(s).ok_or_else(|| AuthError::UnknownRole(s.to_string()))
    }
}

/// Wire shape accepted wherever a role arrives from outside: `1`, `"2"`, `"Admin"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RoleRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<RoleRepr> for Role {
    type Error = AuthError;

    fn try_from(value: RoleRepr) -> Result<Self, Self::Error> {
        match value {
            RoleRepr::Code(code) => {
                Role::from_code(code).ok_or_else(|| AuthError::UnknownRole(code.to_string()))
            }
            RoleRepr::Name(name) => name.parse(),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = RoleRepr::deserialize(deserializer)?;
        Role::try_from(repr).map_err(serde::de::Error::custom)
    }
}
