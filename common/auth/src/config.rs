use jsonwebtoken::{Algorithm, Validation};

/// Issuer/audience pair shared by the token signer and the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    /// Clock skew tolerated on `exp`; zero keeps the one hour session exact.
    pub leeway_seconds: u32,
}

impl JwtConfig {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_seconds: 0,
        }
    }

    pub fn with_leeway(self, leeway_seconds: u32) -> Self {
        Self { leeway_seconds, ..self }
    }

    /// HS256 validation pinned to this issuer and audience.
    pub(crate) fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = u64::from(self.leeway_seconds);
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leeway_defaults_to_zero() {
        let config = JwtConfig::new("sales-service", "sales-dashboard");
        assert_eq!(config.leeway_seconds, 0);
        assert_eq!(config.validation().leeway, 0);
        assert_eq!(config.clone().with_leeway(5).validation().leeway, 5);
    }

    #[test]
    fn validation_is_hs256_only() {
        let validation = JwtConfig::new("i", "a").validation();
        assert_eq!(validation.algorithms, vec![Algorithm::HS256]);
    }
}
