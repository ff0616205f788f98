pub mod authenticate;
pub mod permission;

pub use authenticate::{access_credential, authenticate, Actor, ACCESS_COOKIE, REFRESH_COOKIE};
pub use permission::require_permission;
