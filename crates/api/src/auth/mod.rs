//! Authentication module for PartnerHub

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, HasuraClaims, JwtManager};
pub use middleware::{require_auth, require_superadmin, AuthError, AuthState, SessionContext};
