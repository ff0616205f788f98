use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is malformed or its signature is invalid")]
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by both credential kinds. Refresh credentials carry no role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role at issuance (access credentials only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Credential id, the deny-list key
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredential {
    pub user_id: String,
    pub role: Option<Role>,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

impl VerifiedCredential {
    /// Seconds until expiry, floored at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies HS256 credentials. Access and refresh credentials are
/// signed with separate secrets, so neither verifies as the other.
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: SigningKeys::from_secret(config.access_secret.expose_secret()),
            refresh: SigningKeys::from_secret(config.refresh_secret.expose_secret()),
            access_ttl: Duration::minutes(config.access_token_expiry_minutes),
            refresh_ttl: Duration::days(config.refresh_token_expiry_days),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, user_id: &str, role: Role) -> Result<String, anyhow::Error> {
        self.issue_access_at(user_id, role, Utc::now())
    }

    pub fn issue_access_at(
        &self,
        user_id: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, anyhow::Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            role: Some(role),
            exp: (issued_at + self.access_ttl).timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.access.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))
    }

    pub fn issue_refresh(&self, user_id: &str) -> Result<String, anyhow::Error> {
        self.issue_refresh_at(user_id, Utc::now())
    }

    pub fn issue_refresh_at(
        &self,
        user_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, anyhow::Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            role: None,
            exp: (issued_at + self.refresh_ttl).timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.refresh.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to encode refresh token: {}", e))
    }

    /// Check signature, structure and expiry against the key for `kind`.
    ///
    /// The signature is checked before expiry, so an expired credential with a
    /// bad signature is `Malformed`, never `Expired`.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<VerifiedCredential, TokenError> {
        let key = match kind {
            TokenKind::Access => &self.access.decoding,
            TokenKind::Refresh => &self.refresh.decoding,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?
            .claims;

        if kind == TokenKind::Access && claims.role.is_none() {
            return Err(TokenError::Malformed);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TokenError::Malformed)?;

        Ok(VerifiedCredential {
            user_id: claims.sub,
            role: claims.role,
            jti: claims.jti,
            expires_at,
        })
    }
}
