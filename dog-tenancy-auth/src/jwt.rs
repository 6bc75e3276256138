// Session token signing and verification.

use std::sync::Arc;

use anyhow::Result;
use dog_tenancy::{AccessError, Actor};
use tracing::debug;

use crate::claims::SessionClaims;
use crate::options::{JwtOptions, SessionOptions};

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
use crate::options::JwtAlgorithm;

pub trait JwtProvider: Send + Sync {
    fn sign(&self, jwt: &JwtOptions, claims: &SessionClaims) -> Result<String>;

    fn verify(&self, jwt: &JwtOptions, token: &str) -> Result<SessionClaims>;
}

#[cfg(not(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto")))]
pub struct NoJwtProvider;

#[cfg(not(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto")))]
impl JwtProvider for NoJwtProvider {
    fn sign(&self, _jwt: &JwtOptions, _claims: &SessionClaims) -> Result<String> {
        Err(anyhow::anyhow!(
            "JWT support is disabled (enable one of: jwt-aws-lc-rs, jwt-rust-crypto)"
        ))
    }

    fn verify(&self, _jwt: &JwtOptions, _token: &str) -> Result<SessionClaims> {
        Err(anyhow::anyhow!(
            "JWT support is disabled (enable one of: jwt-aws-lc-rs, jwt-rust-crypto)"
        ))
    }
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
pub struct JsonwebtokenProvider;

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
impl JsonwebtokenProvider {
    fn algorithm(alg: JwtAlgorithm) -> jsonwebtoken::Algorithm {
        match alg {
            JwtAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            JwtAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            JwtAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }

    fn secret(jwt: &JwtOptions) -> Result<&str> {
        jwt.secret
            .as_deref()
            .ok_or_else(|| AccessError::general_error("JWT secret is not configured").into_anyhow())
    }
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
impl JwtProvider for JsonwebtokenProvider {
    fn sign(&self, jwt: &JwtOptions, claims: &SessionClaims) -> Result<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let secret = Self::secret(jwt)?;
        let mut header = Header::new(Self::algorithm(jwt.algorithm));
        header.typ = Some("access".to_string());

        encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AccessError::general_error(e.to_string()).into_anyhow())
    }

    fn verify(&self, jwt: &JwtOptions, token: &str) -> Result<SessionClaims> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let secret = Self::secret(jwt)?;

        let mut validation = Validation::new(Self::algorithm(jwt.algorithm));
        validation.set_issuer(&[jwt.issuer.as_str()]);
        validation.set_audience(&jwt.audience.iter().map(|s| s.as_str()).collect::<Vec<_>>());

        let decoded = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AccessError::not_authenticated(e.to_string()).into_anyhow())?;

        Ok(decoded.claims)
    }
}

fn default_provider() -> Arc<dyn JwtProvider> {
    #[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
    {
        Arc::new(JsonwebtokenProvider)
    }
    #[cfg(not(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto")))]
    {
        Arc::new(NoJwtProvider)
    }
}

/// Issues and verifies session tokens from persisted actor state.
#[derive(Clone)]
pub struct SessionIssuer {
    options: SessionOptions,
    jwt: Arc<dyn JwtProvider>,
}

impl SessionIssuer {
    pub fn new(options: SessionOptions) -> Result<Self> {
        Self::with_provider(options, default_provider())
    }

    pub fn with_provider(options: SessionOptions, jwt: Arc<dyn JwtProvider>) -> Result<Self> {
        options
            .validate()
            .map_err(|e| AccessError::general_error(e).into_anyhow())?;
        Ok(Self { options, jwt })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Sign a fresh token for the actor as currently persisted.
    pub fn issue(&self, actor: &Actor) -> Result<String> {
        let claims = SessionClaims::for_actor(actor, &self.options.jwt);
        debug!(
            "Issuing session {} for {} (active tenant: {:?})",
            claims.jti, claims.sub, claims.active_tenant
        );
        self.jwt.sign(&self.options.jwt, &claims)
    }

    /// Check signature, issuer, audience and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        self.jwt.verify(&self.options.jwt, token)
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("issuer", &self.options.jwt.issuer)
            .field("algorithm", &self.options.jwt.algorithm)
            .finish_non_exhaustive()
    }
}
