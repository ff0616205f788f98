use crate::models::{Permission, PermissionSet, Role};

use super::error::AuthError;

/// The resolved caller of a request.
///
/// `role` is the snapshot embedded in the access credential; `permissions`
/// and `organization_id` are read from the store on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: String,
    pub role: Role,
    pub permissions: PermissionSet,
    pub organization_id: Option<String>,
}

impl ActorContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether [`authorize`] would allow `permission`.
    pub fn holds(&self, permission: Permission) -> bool {
        self.is_admin() || self.permissions.contains(permission)
    }
}

/// Allow or deny `required` for `actor`.
///
/// Admins pass unconditionally. Everyone else needs `required` as an exact
/// member of their stored permission set. Evaluated fresh on every call.
pub fn authorize(actor: Option<&ActorContext>, required: Permission) -> Result<(), AuthError> {
    let actor = actor.ok_or(AuthError::Unauthenticated)?;

    if actor.is_admin() {
        return Ok(());
    }

    if actor.permissions.contains(required) {
        Ok(())
    } else {
        Err(AuthError::insufficient_permissions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, permissions: &[Permission]) -> ActorContext {
        ActorContext {
            user_id: "u1".to_string(),
            role,
            permissions: permissions.iter().copied().collect(),
            organization_id: None,
        }
    }

    #[test]
    fn admin_with_empty_set_passes_every_catalog_permission() {
        let admin = actor(Role::Admin, &[]);
        for permission in Permission::ALL {
            assert!(authorize(Some(&admin), *permission).is_ok(), "{permission}");
        }
    }

    #[test]
    fn non_admin_needs_exact_membership() {
        for role in [Role::Manager, Role::Supervisor, Role::Employee, Role::Viewer] {
            let a = actor(role, &[Permission::CrmRead]);
            for permission in Permission::ALL {
                let allowed = authorize(Some(&a), *permission).is_ok();
                assert_eq!(allowed, *permission == Permission::CrmRead, "{role} {permission}");
            }
        }
    }

    #[test]
    fn hierarchy_grants_nothing() {
        let manager = actor(Role::Manager, &[]);
        assert!(matches!(
            authorize(Some(&manager), Permission::PostsRead),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn missing_actor_is_unauthenticated() {
        assert!(matches!(
            authorize(None, Permission::CrmRead),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn viewer_cannot_create_leads() {
        let viewer = actor(Role::Viewer, &[Permission::CrmRead]);
        let err = authorize(Some(&viewer), Permission::CrmCreate).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient permissions");
    }

    #[test]
    fn permission_changes_apply_to_the_next_evaluation() {
        let mut a = actor(Role::Employee, &[Permission::HrRead]);
        assert!(authorize(Some(&a), Permission::HrRead).is_ok());
        a.permissions.remove(Permission::HrRead);
        assert!(authorize(Some(&a), Permission::HrRead).is_err());
    }
}
