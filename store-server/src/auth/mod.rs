//! Authentication and authorization.
//!
//! - [`JwtService`] token service
//! - [`CurrentUser`] caller context (middleware injects, handlers extract)
//! - [`require_auth`] router-level middleware
//! - [`permissions`] permission name constants

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;
