//! Owner-scoped access for resource kinds carrying an owner reference.
//!
//! Each kind declares a [`ResourcePolicy`] once. The policy says which field
//! holds the owner, which permissions gate each access, whether a generic
//! update/delete permission is enough for a non-owner, and whether the kind
//! is scoped to the actor's organization.

use mongodb::bson::Bson;

use super::{
    authorization::ActorContext,
    error::{AuthError, ServiceError},
    store::{Filter, Record, Repository},
};
use crate::models::{Lead, Meeting, Permission, Post, PostStatus, Project, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Update,
    Delete,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Update => "update",
            Access::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub kind: &'static str,
    pub owner_field: &'static str,
    pub read: Permission,
    pub update: Permission,
    pub delete: Permission,
    pub allow_generic_update: bool,
    pub allow_generic_delete: bool,
    pub org_scoped: bool,
}

impl ResourcePolicy {
    pub fn permission_for(&self, access: Access) -> Permission {
        match access {
            Access::Read => self.read,
            Access::Update => self.update,
            Access::Delete => self.delete,
        }
    }

    /// Per-item decision, after the route's permission gate has passed.
    pub fn check<R: OwnedResource>(
        &self,
        actor: &ActorContext,
        resource: &R,
        access: Access,
    ) -> Result<(), AuthError> {
        if actor.is_admin() || resource.owner_id() == actor.user_id {
            return Ok(());
        }

        let allowed = match access {
            Access::Read => actor.holds(self.read) && resource.is_shared(),
            Access::Update => self.allow_generic_update && actor.holds(self.update),
            Access::Delete => self.allow_generic_delete && actor.holds(self.delete),
        };

        if allowed {
            Ok(())
        } else {
            Err(AuthError::access_denied())
        }
    }

    /// Organization scope: the actor's organization when it has one, its own
    /// records otherwise.
    pub fn scope_filter(&self, actor: &ActorContext) -> Filter {
        if !self.org_scoped {
            return Filter::All;
        }
        match &actor.organization_id {
            Some(org) => Filter::eq("organization_id", org.as_str()),
            None => Filter::eq(self.owner_field, actor.user_id.as_str()),
        }
    }

    /// Server-side predicate for collection reads.
    pub fn list_filter<R: OwnedResource>(&self, actor: &ActorContext) -> Filter {
        let visibility = if actor.is_admin() {
            Filter::All
        } else {
            Filter::or(vec![
                Filter::eq(self.owner_field, actor.user_id.as_str()),
                R::shared_filter(),
            ])
        };
        Filter::and(vec![self.scope_filter(actor), visibility])
    }

    /// Load one record inside the actor's scope. Misses are 404 so records in
    /// other organizations stay undisclosed.
    pub async fn find_in_scope<R: OwnedResource>(
        &self,
        repo: &dyn Repository<R>,
        actor: &ActorContext,
        id: &str,
    ) -> Result<R, ServiceError> {
        repo.find_one(Filter::and(vec![Filter::id(id), self.scope_filter(actor)]))
            .await?
            .ok_or(ServiceError::NotFound(self.kind))
    }
}

pub trait OwnedResource: Record {
    const POLICY: ResourcePolicy;

    fn owner_id(&self) -> &str;

    /// Whether a non-owner holding the read permission may see this record.
    fn is_shared(&self) -> bool {
        true
    }

    /// Query form of [`OwnedResource::is_shared`].
    fn shared_filter() -> Filter {
        Filter::All
    }
}

pub const POSTS: ResourcePolicy = ResourcePolicy {
    kind: "Post",
    owner_field: "author_id",
    read: Permission::PostsRead,
    update: Permission::PostsUpdate,
    delete: Permission::PostsDelete,
    allow_generic_update: false,
    allow_generic_delete: false,
    org_scoped: false,
};

pub const LEADS: ResourcePolicy = ResourcePolicy {
    kind: "Lead",
    owner_field: "assigned_to",
    read: Permission::CrmRead,
    update: Permission::CrmUpdate,
    delete: Permission::CrmDelete,
    allow_generic_update: true,
    allow_generic_delete: true,
    org_scoped: true,
};

pub const PROJECTS: ResourcePolicy = ResourcePolicy {
    kind: "Project",
    owner_field: "manager",
    read: Permission::ProjectsRead,
    update: Permission::ProjectsUpdate,
    delete: Permission::ProjectsDelete,
    allow_generic_update: true,
    allow_generic_delete: true,
    org_scoped: true,
};

pub const MEETINGS: ResourcePolicy = ResourcePolicy {
    kind: "Meeting",
    owner_field: "created_by",
    read: Permission::HrRead,
    update: Permission::HrUpdate,
    delete: Permission::HrDelete,
    allow_generic_update: true,
    allow_generic_delete: true,
    org_scoped: true,
};

impl OwnedResource for Post {
    const POLICY: ResourcePolicy = POSTS;

    fn owner_id(&self) -> &str {
        &self.author_id
    }

    fn is_shared(&self) -> bool {
        self.is_published_public()
    }

    fn shared_filter() -> Filter {
        Filter::and(vec![
            Filter::eq("status", Bson::from(PostStatus::Published.as_str())),
            Filter::eq("visibility", Bson::from(Visibility::Public.as_str())),
        ])
    }
}

impl OwnedResource for Lead {
    const POLICY: ResourcePolicy = LEADS;

    fn owner_id(&self) -> &str {
        &self.assigned_to
    }
}

impl OwnedResource for Project {
    const POLICY: ResourcePolicy = PROJECTS;

    fn owner_id(&self) -> &str {
        &self.manager
    }
}

impl OwnedResource for Meeting {
    const POLICY: ResourcePolicy = MEETINGS;

    fn owner_id(&self) -> &str {
        &self.created_by
    }
}
