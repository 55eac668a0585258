//! Authentication Layer
//!
//! Token issuance lives in an external identity service; this module
//! only validates bearer tokens and loads the matching profile.

pub mod error;
pub mod jwt;
pub mod middleware;

pub use error::{AuthError, AuthResult};
pub use middleware::{optional_auth, require_auth, AuthUser, MaybeUser};
