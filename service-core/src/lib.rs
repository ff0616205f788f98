//! service-core: configuration, error rendering, HTTP middleware and
//! observability shared by the atrium services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
