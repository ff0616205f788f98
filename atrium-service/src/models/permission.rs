//! The closed permission catalog.
//!
//! Permissions are `<domain>:<action>` strings. Only the strings listed in the
//! catalog below exist; anything else is rejected when parsed, deserialized
//! from a request body or loaded from the store.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeSet, fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("Unknown permission: {0}")]
    Unknown(String),
}

macro_rules! permission_catalog {
    ($($variant:ident => $name:literal,)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Permission {
            $($variant,)+
        }

        impl Permission {
            pub const ALL: &'static [Permission] = &[$(Permission::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Permission::$variant => $name,)+
                }
            }
        }

        impl FromStr for Permission {
            type Err = PermissionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Permission::$variant),)+
                    other => Err(PermissionError::Unknown(other.to_string())),
                }
            }
        }
    };
}

permission_catalog! {
    OrgManage => "org:manage",
    OrgRead => "org:read",
    UsersCreate => "users:create",
    UsersRead => "users:read",
    UsersUpdate => "users:update",
    UsersDelete => "users:delete",
    RolesAssign => "roles:assign",
    RolesRead => "roles:read",
    CrmCreate => "crm:create",
    CrmRead => "crm:read",
    CrmUpdate => "crm:update",
    CrmDelete => "crm:delete",
    HrCreate => "hr:create",
    HrRead => "hr:read",
    HrUpdate => "hr:update",
    HrDelete => "hr:delete",
    HrApproveLeave => "hr:approveLeave",
    InventoryCreate => "inventory:create",
    InventoryRead => "inventory:read",
    InventoryUpdate => "inventory:update",
    InventoryDelete => "inventory:delete",
    FinanceCreate => "finance:create",
    FinanceRead => "finance:read",
    FinanceUpdate => "finance:update",
    FinanceDelete => "finance:delete",
    FinanceApprove => "finance:approve",
    FinanceExport => "finance:export",
    ProjectsCreate => "projects:create",
    ProjectsRead => "projects:read",
    ProjectsUpdate => "projects:update",
    ProjectsDelete => "projects:delete",
    ProjectsAssign => "projects:assign",
    PostsCreate => "posts:create",
    PostsRead => "posts:read",
    PostsUpdate => "posts:update",
    PostsDelete => "posts:delete",
}

impl Permission {
    pub fn domain(&self) -> &'static str {
        self.as_str().split_once(':').map(|(d, _)| d).unwrap_or("")
    }

    pub fn action(&self) -> &'static str {
        self.as_str().split_once(':').map(|(_, a)| a).unwrap_or("")
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// The permissions stored on an identity. Membership is exact: no prefix or
/// wildcard matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every string or fail on the first unknown one; nothing partial is returned.
    pub fn parse<I, S>(items: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items
            .into_iter()
            .map(|s| s.as_ref().parse::<Permission>())
            .collect()
    }

    /// Granted to every self-registered identity.
    pub fn registration_default() -> Self {
        [
            Permission::OrgManage,
            Permission::CrmCreate,
            Permission::CrmRead,
            Permission::CrmUpdate,
            Permission::CrmDelete,
            Permission::ProjectsCreate,
            Permission::ProjectsRead,
            Permission::ProjectsUpdate,
            Permission::ProjectsDelete,
        ]
        .into_iter()
        .collect()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn remove(&mut self, permission: Permission) -> bool {
        self.0.remove(&permission)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_entry_parses_back_to_itself() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>(), Ok(*permission));
        }
    }

    #[test]
    fn unknown_strings_are_rejected() {
        for raw in ["crm:approve", "crm:*", "CRM:read", "crm:read ", "crm", ""] {
            assert_eq!(
                raw.parse::<Permission>(),
                Err(PermissionError::Unknown(raw.to_string())),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn domain_and_action_split_on_colon() {
        assert_eq!(Permission::HrApproveLeave.domain(), "hr");
        assert_eq!(Permission::HrApproveLeave.action(), "approveLeave");
    }

    #[test]
    fn set_parse_fails_on_first_unknown() {
        let err = PermissionSet::parse(["crm:read", "crm:launch", "hr:read"]).unwrap_err();
        assert_eq!(err, PermissionError::Unknown("crm:launch".to_string()));
    }

    #[test]
    fn deserializing_an_unknown_permission_fails() {
        let ok: PermissionSet = serde_json::from_str(r#"["crm:read","hr:read"]"#).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<PermissionSet>(r#"["crm:read","crm:sudo"]"#).is_err());
    }

    #[test]
    fn registration_default_grants_crm_and_projects() {
        let set = PermissionSet::registration_default();
        assert!(set.contains(Permission::OrgManage));
        assert!(set.contains(Permission::CrmDelete));
        assert!(set.contains(Permission::ProjectsUpdate));
        assert!(!set.contains(Permission::UsersRead));
        assert_eq!(set.len(), 9);
    }
}
