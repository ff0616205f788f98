//! Business logic for atrium-service.
//!
//! The request path runs leaf-first through [`TokenIssuer`], the
//! [`Authenticator`] (credential to actor), [`authorize`] (actor and permission
//! to allow/deny) and, inside resource handlers, the ownership policies.

mod audit;
mod auth;
mod authenticator;
mod authorization;
pub mod deny_list;
pub mod error;
pub mod ownership;
pub mod store;
mod token;
mod users;

pub use audit::SecurityAuditService;
pub use auth::{AuthService, LoginOutcome};
pub use authenticator::Authenticator;
pub use authorization::{authorize, ActorContext};
pub use deny_list::{InMemoryDenyList, RedisDenyList, TokenDenyList};
pub use error::{AuthError, ServiceError};
pub use ownership::{Access, OwnedResource, ResourcePolicy};
pub use store::{Filter, MongoDb, Repository, SortBy, StoreError, Stores};
pub use token::{Claims, TokenError, TokenIssuer, TokenKind, VerifiedCredential};
pub use users::{UserChanges, UserService};
