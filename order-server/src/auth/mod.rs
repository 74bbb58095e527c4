//! 认证授权模块
//!
//! - [`JwtService`] - token issuing and validation
//! - [`Actor`] / [`AuthScope`] - tenant-scoped principal, threaded into every call
//! - [`require_auth`] - middleware resolving the actor once per request

pub mod jwt;
pub mod middleware;
pub mod scope;

pub use jwt::{Claims, JwtError, JwtService, PrincipalKind};
pub use middleware::require_auth;
pub use scope::{Actor, AuthScope, BranchChoice, GuardError, TenantFilter};
