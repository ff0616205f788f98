pub mod audit;
pub mod lead;
pub mod meeting;
pub mod organization;
pub mod permission;
pub mod post;
pub mod project;
pub mod role;
pub mod user;

pub use audit::{SecurityAuditLog, SecurityEventType};
pub use lead::{Lead, LeadStatus};
pub use meeting::{Meeting, MeetingStatus, MeetingType};
pub use organization::{Organization, OrganizationModule, SubscriptionPlan};
pub use permission::{Permission, PermissionError, PermissionSet};
pub use post::{Post, PostStatus, Visibility};
pub use project::{Project, ProjectPriority, ProjectStatus, ProjectUpdate};
pub use role::{Role, RoleError};
pub use user::User;
