use chrono::Utc;
use std::sync::Arc;

use super::{
    audit::SecurityAuditService,
    authorization::ActorContext,
    error::{AuthError, ServiceError},
    store::{Filter, Repository, SortBy},
};
use crate::models::{Permission, PermissionSet, Role, SecurityEventType, User};

/// Profile and administrative changes to one identity.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

/// Identity management, scoped to the actor's organization.
///
/// Role and permission mutations are last-writer-wins.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn Repository<User>>,
    audit: SecurityAuditService,
}

impl UserService {
    pub fn new(users: Arc<dyn Repository<User>>, audit: SecurityAuditService) -> Self {
        Self { users, audit }
    }

    fn scope(actor: &ActorContext) -> Filter {
        match &actor.organization_id {
            Some(org) => Filter::eq("organization_id", org.as_str()),
            None => Filter::id(&actor.user_id),
        }
    }

    pub async fn list(&self, actor: &ActorContext) -> Result<Vec<User>, ServiceError> {
        Ok(self
            .users
            .find(Self::scope(actor), SortBy::newest_first())
            .await?)
    }

    pub async fn get(&self, actor: &ActorContext, id: &str) -> Result<User, ServiceError> {
        self.users
            .find_one(Filter::and(vec![Filter::id(id), Self::scope(actor)]))
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: &str,
        changes: UserChanges,
    ) -> Result<User, ServiceError> {
        let role = changes.role.as_deref().map(str::parse::<Role>).transpose()?;

        let mut user = self.get(actor, id).await?;

        if let Some(role) = role {
            if user.id == actor.user_id && role != user.role {
                return Err(self.deny_self_role_change(actor).into());
            }
        }

        if let Some(username) = changes.username {
            user.username = username.trim().to_string();
        }
        if let Some(email) = changes.email {
            user.email = email.trim().to_lowercase();
        }
        if actor.is_admin() {
            if let Some(role) = role {
                user.role = role;
            }
            if let Some(active) = changes.active {
                user.active = active;
            }
        }

        user.updated_at = Utc::now();
        self.save(&user).await?;
        Ok(user)
    }

    pub async fn delete(&self, actor: &ActorContext, id: &str) -> Result<(), ServiceError> {
        if id == actor.user_id {
            return Err(ServiceError::BadRequest(
                "Cannot delete your own account".to_string(),
            ));
        }

        let user = self.get(actor, id).await?;
        if !self.users.delete(&user.id).await? {
            return Err(ServiceError::NotFound("User"));
        }
        tracing::info!(actor = %actor.user_id, user_id = %user.id, "User deleted");
        Ok(())
    }

    /// Role-management operation. Nobody may change their own role, admins
    /// included.
    pub async fn change_role(
        &self,
        actor: &ActorContext,
        id: &str,
        role: &str,
    ) -> Result<User, ServiceError> {
        if id == actor.user_id {
            return Err(self.deny_self_role_change(actor).into());
        }
        let role: Role = role.parse()?;

        let mut user = self.get(actor, id).await?;
        user.role = role;
        user.updated_at = Utc::now();
        self.save(&user).await?;

        tracing::info!(actor = %actor.user_id, user_id = %user.id, role = %role, "Role changed");
        Ok(user)
    }

    /// Replace the stored permission set. Admin only, and never on the
    /// actor's own identity. Unknown strings reject the whole request and
    /// nothing is stored.
    pub async fn set_permissions(
        &self,
        actor: &ActorContext,
        id: &str,
        permissions: &[String],
    ) -> Result<User, ServiceError> {
        if id == actor.user_id {
            self.audit.record_denial(
                actor,
                SecurityEventType::SelfPermissionChangeDenied,
                Some(Permission::RolesAssign),
                Some(format!("user:{}", actor.user_id)),
                "Cannot change your own permissions",
            );
            return Err(AuthError::SelfPermissionChangeForbidden.into());
        }
        if !actor.is_admin() {
            self.audit.record_denial(
                actor,
                SecurityEventType::PermissionDenied,
                Some(Permission::RolesAssign),
                Some(format!("user:{}", id)),
                "Permission sets are managed by admins",
            );
            return Err(AuthError::insufficient_permissions().into());
        }
        let permissions = PermissionSet::parse(permissions)?;

        let mut user = self.get(actor, id).await?;
        user.permissions = permissions;
        user.updated_at = Utc::now();
        self.save(&user).await?;

        tracing::info!(
            actor = %actor.user_id,
            user_id = %user.id,
            count = user.permissions.len(),
            "Permissions replaced"
        );
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), ServiceError> {
        if !self.users.replace(user).await? {
            return Err(ServiceError::NotFound("User"));
        }
        Ok(())
    }

    fn deny_self_role_change(&self, actor: &ActorContext) -> AuthError {
        self.audit.record_denial(
            actor,
            SecurityEventType::SelfRoleChangeDenied,
            Some(Permission::RolesAssign),
            Some(format!("user:{}", actor.user_id)),
            "Cannot change your own role",
        );
        AuthError::SelfRoleChangeForbidden
    }
}
