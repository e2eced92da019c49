//! Bearer-token verification and permission enforcement.
//!
//! request header -> `bearer` -> `validator` (keys from `jwks`) -> `permissions`
//! -> `AuthService::enforce` -> `Principal` | `AuthError`

pub mod bearer;
pub mod error;
pub mod factory;
pub mod jwks;
pub mod permissions;
pub mod principal;
pub mod service;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::AuthError;
pub use factory::build_auth_service;
pub use jwks::JwksCache;
pub use permissions::Permission;
pub use service::AuthService;
pub use validator::CredentialValidator;
