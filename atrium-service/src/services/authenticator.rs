use std::sync::Arc;

use super::{
    authorization::ActorContext,
    deny_list::TokenDenyList,
    error::AuthError,
    store::Repository,
    token::{TokenIssuer, TokenKind},
};
use crate::models::User;

/// Turns an access credential into an [`ActorContext`].
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<TokenIssuer>,
    users: Arc<dyn Repository<User>>,
    deny_list: Option<Arc<dyn TokenDenyList>>,
}

impl Authenticator {
    pub fn new(
        tokens: Arc<TokenIssuer>,
        users: Arc<dyn Repository<User>>,
        deny_list: Option<Arc<dyn TokenDenyList>>,
    ) -> Self {
        Self {
            tokens,
            users,
            deny_list,
        }
    }

    pub async fn resolve(&self, credential: Option<&str>) -> Result<ActorContext, AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoCredential)?;

        let verified = self.tokens.verify(token, TokenKind::Access)?;
        self.ensure_not_revoked(&verified.jti).await?;

        let user = self
            .users
            .find_by_id(&verified.user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Credential store lookup failed");
                AuthError::from(e)
            })?
            .filter(|u| u.active)
            .ok_or(AuthError::Unauthorized)?;

        Ok(ActorContext {
            role: verified.role.unwrap_or(user.role),
            user_id: user.id,
            permissions: user.permissions,
            organization_id: user.organization_id,
        })
    }

    /// Fails with `Revoked` for a denied id. A failed lookup is store
    /// unavailability, never a 401.
    pub async fn ensure_not_revoked(&self, jti: &str) -> Result<(), AuthError> {
        let Some(deny_list) = &self.deny_list else {
            return Ok(());
        };

        let denied = deny_list.is_denied(jti).await.map_err(|e| {
            tracing::error!(error = %e, "Deny-list lookup failed");
            AuthError::StoreUnavailable(e.to_string())
        })?;

        if denied {
            return Err(AuthError::Revoked);
        }
        Ok(())
    }
}
