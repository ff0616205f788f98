use service_core::error::AppError;
use thiserror::Error;

use super::store::StoreError;
use super::token::TokenError;
use crate::models::{PermissionError, RoleError};

/// Authentication and authorization failures.
///
/// Missing, unknown and disabled identities all surface as the same 401 so
/// callers cannot tell whether an account exists.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token, authorization denied")]
    NoCredential,

    #[error("Token is not valid")]
    MalformedCredential,

    #[error("Token has expired")]
    ExpiredCredential,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token is not valid")]
    Unauthorized,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("Cannot change your own role")]
    SelfRoleChangeForbidden,

    #[error("Cannot change your own permissions")]
    SelfPermissionChangeForbidden,

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AuthError {
    pub fn insufficient_permissions() -> Self {
        AuthError::Forbidden("Insufficient permissions".to_string())
    }

    pub fn access_denied() -> Self {
        AuthError::Forbidden("Access denied".to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredCredential,
            TokenError::Malformed => AuthError::MalformedCredential,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NoCredential
            | AuthError::MalformedCredential
            | AuthError::ExpiredCredential
            | AuthError::Revoked
            | AuthError::Unauthorized
            | AuthError::Unauthenticated => AppError::Unauthorized(anyhow::anyhow!(err.to_string())),
            AuthError::Forbidden(_)
            | AuthError::SelfRoleChangeForbidden
            | AuthError::SelfPermissionChangeForbidden => {
                AppError::Forbidden(anyhow::anyhow!(err.to_string()))
            }
            AuthError::StoreUnavailable(cause) => AppError::DatabaseError(anyhow::anyhow!(cause)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AppError::Conflict(anyhow::anyhow!("Resource already exists")),
            other => AppError::DatabaseError(anyhow::anyhow!(other)),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),
}

impl From<PermissionError> for ServiceError {
    fn from(err: PermissionError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<RoleError> for ServiceError {
    fn from(err: RoleError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Auth(e) => e.into(),
            ServiceError::Store(StoreError::Duplicate(_)) => {
                AppError::Conflict(anyhow::anyhow!("User already exists"))
            }
            ServiceError::Store(e) => e.into(),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::UserAlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("User already exists"))
            }
            ServiceError::NotFound(kind) => AppError::NotFound(anyhow::anyhow!("{} not found", kind)),
            ServiceError::BadRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Validation(msg) => AppError::Unprocessable(anyhow::anyhow!(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn credential_failures_are_401() {
        for err in [
            AuthError::NoCredential,
            AuthError::MalformedCredential,
            AuthError::ExpiredCredential,
            AuthError::Revoked,
            AuthError::Unauthorized,
            AuthError::Unauthenticated,
        ] {
            assert_eq!(AppError::from(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn denials_are_403_and_store_failures_500() {
        assert_eq!(
            AppError::from(AuthError::insufficient_permissions()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::SelfRoleChangeForbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::StoreUnavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_store_key_is_conflict() {
        let err = ServiceError::Store(StoreError::Duplicate("users.email".into()));
        assert_eq!(AppError::from(err).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_permission_is_unprocessable() {
        let err: ServiceError = PermissionError::Unknown("crm:sudo".into()).into();
        assert_eq!(AppError::from(err).status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
