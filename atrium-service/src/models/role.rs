use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Identity role. Only [`Role::Admin`] changes an authorization decision;
/// the ranking below is descriptive metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "editor")]
    Manager,
    Supervisor,
    Employee,
    #[default]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Supervisor,
        Role::Employee,
        Role::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Supervisor => "supervisor",
            Role::Employee => "employee",
            Role::Viewer => "viewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn rank(&self) -> u8 {
        match self {
            Role::Admin => 4,
            Role::Manager => 3,
            Role::Supervisor => 2,
            Role::Employee => 1,
            Role::Viewer => 0,
        }
    }

    /// Roles ranked below this one.
    pub fn subordinates(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| r.rank() < self.rank())
            .collect()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "Full access to every module",
            Role::Manager => "Manages teams, projects and content",
            Role::Supervisor => "Oversees day-to-day operations",
            Role::Employee => "Works with assigned records",
            Role::Viewer => "Read-only access",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" | "editor" => Ok(Role::Manager),
            "supervisor" => Ok(Role::Supervisor),
            "employee" => Ok(Role::Employee),
            "viewer" => Ok(Role::Viewer),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_is_an_alias_for_manager() {
        assert_eq!("editor".parse::<Role>(), Ok(Role::Manager));
        let role: Role = serde_json::from_str("\"editor\"").unwrap();
        assert_eq!(role, Role::Manager);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"manager\"");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(
            "root".parse::<Role>(),
            Err(RoleError::Unknown("root".to_string()))
        );
        assert!(serde_json::from_str::<Role>("\"Admin\"").is_err());
    }

    #[test]
    fn only_admin_is_admin() {
        let admins: Vec<Role> = Role::ALL.into_iter().filter(Role::is_admin).collect();
        assert_eq!(admins, vec![Role::Admin]);
    }

    #[test]
    fn hierarchy_is_ordered() {
        assert_eq!(
            Role::Manager.subordinates(),
            vec![Role::Supervisor, Role::Employee, Role::Viewer]
        );
        assert!(Role::Viewer.subordinates().is_empty());
        assert_eq!(Role::default(), Role::Viewer);
    }
}
