//! Authentication
//!
//! HS256 access tokens, argon2 password hashes and the middleware that
//! guards `/api/*` routes.

mod jwt;
mod middleware;
mod password;

pub use jwt::JwtKeys;
pub use middleware::{require_auth, AuthUser};
pub use password::{hash_password, verify_password};
