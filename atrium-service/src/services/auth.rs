use chrono::Utc;
use std::sync::Arc;

use super::{
    authenticator::Authenticator,
    authorization::ActorContext,
    deny_list::TokenDenyList,
    error::{AuthError, ServiceError},
    store::{Filter, Repository},
    token::{TokenIssuer, TokenKind},
};
use crate::models::{Organization, PermissionSet, Role, User};
use crate::utils::password::{
    hash_password, verify_against_dummy, verify_password, Password, PasswordHashString,
};

pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn Repository<User>>,
    organizations: Arc<dyn Repository<Organization>>,
    tokens: Arc<TokenIssuer>,
    authenticator: Authenticator,
    deny_list: Option<Arc<dyn TokenDenyList>>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn Repository<User>>,
        organizations: Arc<dyn Repository<Organization>>,
        tokens: Arc<TokenIssuer>,
        deny_list: Option<Arc<dyn TokenDenyList>>,
    ) -> Self {
        let authenticator = Authenticator::new(tokens.clone(), users.clone(), deny_list.clone());
        Self {
            users,
            organizations,
            tokens,
            authenticator,
            deny_list,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Create an admin identity and provision its organization.
    ///
    /// A failed organization insert leaves the identity without one.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: Password,
    ) -> Result<User, ServiceError> {
        let username = username.trim();
        let email = email.trim().to_lowercase();

        let existing = self
            .users
            .find_one(Filter::or(vec![
                Filter::eq("email", email.as_str()),
                Filter::eq("username", username),
            ]))
            .await?;
        if existing.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&password)?;
        let mut user = User::new(
            username.to_string(),
            email.clone(),
            password_hash.into_string(),
            Role::Admin,
            PermissionSet::registration_default(),
        );
        self.users.insert(&user).await?;

        let organization = Organization::for_registration(username, &email);
        if let Err(e) = self.organizations.insert(&organization).await {
            tracing::warn!(user_id = %user.id, error = %e, "Organization provisioning failed");
            return Ok(user);
        }

        user.organization_id = Some(organization.id.clone());
        user.updated_at = Utc::now();
        if let Err(e) = self.users.replace(&user).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to link organization");
            user.organization_id = None;
            return Ok(user);
        }

        tracing::info!(user_id = %user.id, organization_id = %organization.id, "User registered");
        Ok(user)
    }

    /// Unknown, disabled and wrong-password all fail the same way.
    pub async fn login(&self, email: &str, password: Password) -> Result<LoginOutcome, ServiceError> {
        let email = email.trim().to_lowercase();

        let candidate = self
            .users
            .find_one(Filter::eq("email", email.as_str()))
            .await?
            .filter(|u| u.active);
        let Some(mut user) = candidate else {
            verify_against_dummy(&password);
            return Err(ServiceError::InvalidCredentials);
        };

        let hash = PasswordHashString::new(user.password_hash.clone());
        if !verify_password(&password, &hash)? {
            tracing::info!(user_id = %user.id, "Login rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        user.last_login = Some(mongodb::bson::DateTime::now());
        self.users.replace(&user).await?;

        let access_token = self.tokens.issue_access(&user.id, user.role)?;
        let refresh_token = self.tokens.issue_refresh(&user.id)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// New access credential for a valid refresh credential. The refresh
    /// credential itself is not rotated. The new access credential carries
    /// the currently stored role.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String, ServiceError> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoCredential)?;

        let verified = self
            .tokens
            .verify(token, TokenKind::Refresh)
            .map_err(AuthError::from)?;
        self.authenticator.ensure_not_revoked(&verified.jti).await?;

        let user = self
            .users
            .find_by_id(&verified.user_id)
            .await
            .map_err(AuthError::from)?
            .filter(|u| u.active)
            .ok_or(AuthError::Unauthorized)?;

        Ok(self.tokens.issue_access(&user.id, user.role)?)
    }

    /// Deny both presented credentials for their remaining lifetime when
    /// revocation is enabled. Never fails.
    pub async fn logout(&self, access_token: Option<&str>, refresh_token: Option<&str>) {
        let Some(deny_list) = &self.deny_list else {
            return;
        };

        let presented = [
            (access_token, TokenKind::Access),
            (refresh_token, TokenKind::Refresh),
        ];
        let now = Utc::now();

        for (token, kind) in presented {
            let Some(verified) = token.and_then(|t| self.tokens.verify(t, kind).ok()) else {
                continue;
            };
            let ttl = verified.remaining_seconds(now);
            if let Err(e) = deny_list.deny(&verified.jti, ttl).await {
                tracing::warn!(user_id = %verified.user_id, error = %e, "Failed to revoke credential");
            }
        }
    }

    /// The actor's identity and, when it loads, its organization.
    pub async fn me(&self, actor: &ActorContext) -> Result<(User, Option<Organization>), ServiceError> {
        let user = self
            .users
            .find_by_id(&actor.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let organization = match &user.organization_id {
            Some(id) => match self.organizations.find_by_id(id).await {
                Ok(org) => org,
                Err(e) => {
                    tracing::warn!(organization_id = %id, error = %e, "Failed to load organization");
                    None
                }
            },
            None => None,
        };

        Ok((user, organization))
    }
}
