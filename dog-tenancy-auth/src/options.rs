// Session and JWT options.

use std::time::Duration;

use dog_tenancy::ConfigSnapshot;
use serde::{Deserialize, Serialize};

pub const JWT_SECRET_KEY: &str = "auth.jwt.secret";
pub const JWT_ISSUER_KEY: &str = "auth.jwt.issuer";
pub const JWT_AUDIENCE_KEY: &str = "auth.jwt.audience";
pub const JWT_EXPIRES_IN_KEY: &str = "auth.jwt.expires_in";

/// JWT signing algorithms (HMAC only)
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    #[default]
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

/// JWT-specific configuration options
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtOptions {
    /// JWT signing algorithm
    pub algorithm: JwtAlgorithm,
    /// Token issuer (iss claim)
    pub issuer: String,
    /// Token audience (aud claim)
    pub audience: Vec<String>,
    /// Session token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_expires_in: Duration,
    /// JWT signing secret
    pub secret: Option<String>,
}

impl Default for JwtOptions {
    fn default() -> Self {
        Self {
            algorithm: JwtAlgorithm::default(),
            issuer: "dogrs-auth".to_string(),
            audience: vec!["dogrs-api".to_string()],
            access_token_expires_in: Duration::from_secs(3600), // 1 hour
            secret: None,
        }
    }
}

impl JwtOptions {
    /// Validate JWT configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.issuer.is_empty() {
            return Err("JWT issuer cannot be empty".to_string());
        }

        if self.audience.is_empty() {
            return Err("JWT audience cannot be empty".to_string());
        }

        if self.secret.as_deref().map_or(true, str::is_empty) {
            return Err("HMAC algorithms require a secret".to_string());
        }

        if self.access_token_expires_in.as_secs() == 0 {
            return Err("Access token expiration must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct HumanDuration(#[serde(with = "humantime_serde")] Duration);

fn parse_duration(raw: &str) -> Result<Duration, String> {
    serde_json::from_value::<HumanDuration>(serde_json::Value::String(raw.to_string()))
        .map(|d| d.0)
        .map_err(|e| format!("Invalid duration '{}': {}", raw, e))
}

/// Session configuration for the tenancy auth layer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionOptions {
    pub jwt: JwtOptions,
    /// Reject tokens whose roles, tenants or active tenant no longer match
    /// the persisted actor.
    pub check_freshness: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            jwt: JwtOptions::default(),
            check_freshness: true,
        }
    }
}

impl SessionOptions {
    pub fn validate(&self) -> Result<(), String> {
        self.jwt
            .validate()
            .map_err(|e| format!("JWT validation failed: {}", e))
    }

    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::new()
    }

    /// Defaults overridden by `auth.jwt.*` keys.
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Result<Self, String> {
        let mut options = Self::default();
        if let Some(secret) = snapshot.get_string(JWT_SECRET_KEY) {
            options.jwt.secret = Some(secret);
        }
        if let Some(issuer) = snapshot.get_string(JWT_ISSUER_KEY) {
            options.jwt.issuer = issuer;
        }
        if let Some(audience) = snapshot.get_list(JWT_AUDIENCE_KEY) {
            options.jwt.audience = audience;
        }
        if let Some(raw) = snapshot.get(JWT_EXPIRES_IN_KEY) {
            options.jwt.access_token_expires_in = parse_duration(raw)?;
        }
        Ok(options)
    }
}

/// Builder pattern for SessionOptions configuration
#[derive(Clone, Debug, Default)]
pub struct SessionOptionsBuilder {
    jwt: JwtOptions,
    check_freshness: Option<bool>,
}

impl SessionOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt.secret = Some(secret.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.jwt.issuer = issuer.into();
        self
    }

    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.jwt.audience = audience;
        self
    }

    pub fn algorithm(mut self, algorithm: JwtAlgorithm) -> Self {
        self.jwt.algorithm = algorithm;
        self
    }

    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.jwt.access_token_expires_in = expires_in;
        self
    }

    pub fn check_freshness(mut self, enabled: bool) -> Self {
        self.check_freshness = Some(enabled);
        self
    }

    pub fn build(self) -> SessionOptions {
        SessionOptions {
            jwt: self.jwt,
            check_freshness: self.check_freshness.unwrap_or(true),
        }
    }

    pub fn build_validated(self) -> Result<SessionOptions, String> {
        let options = self.build();
        options.validate()?;
        Ok(options)
    }
}
