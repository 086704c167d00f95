//! Shared-secret JWT adapter for real-time handshakes.
//!
//! This adapter implements the `SessionValidator` port for tokens signed with
//! HS256 by the platform's account service. It validates:
//!
//! - **Signature**: HMAC-SHA256 with the configured secret
//! - **Expiry (exp)**: Must be in the future (with configurable leeway)
//! - **Issuer (iss)**: Checked only when an issuer is configured
//! - **Subject (sub)**: Becomes the `SubscriberId` the connection is bound to

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedSubscriber, SubscriberId, Timestamp};
use crate::ports::SessionValidator;

/// JWT claims accepted at the handshake.
#[derive(Debug, Serialize, Deserialize)]
struct SubscriberClaims {
    /// Subject - the subscriber ID
    sub: String,

    /// Expiry timestamp (Unix epoch seconds)
    exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
}

/// HS256 session validator.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    issuer: Option<String>,
    leeway_secs: u64,
}

impl JwtSessionValidator {
    pub fn new(secret: &SecretString, issuer: Option<String>, leeway_secs: u64) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            issuer,
            leeway_secs,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedSubscriber, AuthError> {
        let token_data = decode::<SubscriberClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer => {
                        tracing::warn!("Invalid issuer in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::debug!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })?;
        let claims = token_data.claims;

        let subscriber_id = SubscriberId::new(claims.sub).map_err(|_| {
            tracing::warn!("Token has blank subject");
            AuthError::InvalidToken
        })?;
        let expires_at = Timestamp::from_unix_millis(claims.exp.saturating_mul(1000))
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthenticatedSubscriber::new(subscriber_id, expires_at))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("issuer", &self.issuer)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}

/// Issues an HS256 token the validator accepts. Used by tests and local tooling.
pub fn issue_token(
    secret: &SecretString,
    subscriber_id: &SubscriberId,
    issuer: Option<&str>,
    ttl_secs: i64,
) -> Result<String, AuthError> {
    let claims = SubscriberClaims {
        sub: subscriber_id.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_secs,
        iss: issuer.map(str::to_string),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AuthError::service_unavailable(format!("Failed to sign token: {}", e)))
}
