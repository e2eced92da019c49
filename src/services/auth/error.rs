//! Typed failures of bearer-token verification and permission enforcement.
//!
//! Every variant maps to exactly one machine-readable `code` so that clients
//! (and tests) can branch on it. The route layer never collapses these into a
//! generic error.

use std::collections::BTreeSet;

use axum::http::StatusCode;
use thiserror::Error;

use super::permissions::Permission;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingCredential,

    #[error("malformed credential: {0}")]
    MalformedCredential(&'static str),

    #[error("token is signed with an untrusted algorithm")]
    UnsupportedAlgorithm,

    #[error("no verification key matches the token key id")]
    UnknownSigningKey,

    #[error("verification keys could not be loaded")]
    KeySourceUnavailable,

    #[error("token signature does not verify")]
    InvalidSignature,

    #[error("token is expired")]
    ExpiredCredential,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token issuer is not trusted")]
    InvalidIssuer,

    #[error("token audience does not match")]
    InvalidAudience,

    #[error("token is missing the '{0}' claim")]
    MissingClaim(&'static str),

    #[error("token does not carry a permissions claim")]
    PermissionsClaimMissing,

    // `granted` is kept for internal diagnostics only; Display never prints it.
    #[error("permission '{required}' is not granted")]
    InsufficientPermission {
        required: Permission,
        granted: BTreeSet<String>,
    },
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "authorization_header_missing",
            Self::MalformedCredential(_) => "invalid_header",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::KeySourceUnavailable => "key_source_unavailable",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredCredential => "token_expired",
            Self::NotYetValid
            | Self::InvalidIssuer
            | Self::InvalidAudience
            | Self::MissingClaim(_)
            | Self::PermissionsClaimMissing => "invalid_claims",
            Self::InsufficientPermission { .. } => "invalid_permissions",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InsufficientPermission { .. } => StatusCode::FORBIDDEN,
            Self::KeySourceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing description. Never includes the granted permission set or
    /// any trust configuration (expected issuer/audience/algorithm).
    pub fn description(&self) -> String {
        match self {
            Self::MissingCredential => "Authorization header is expected.".into(),
            Self::MalformedCredential(reason) => {
                format!("Authorization header is invalid: {reason}.")
            }
            Self::UnsupportedAlgorithm => "Token is signed with an unsupported algorithm.".into(),
            Self::UnknownSigningKey => "Unable to find the appropriate key.".into(),
            Self::KeySourceUnavailable => {
                "Unable to load verification keys, try again later.".into()
            }
            Self::InvalidSignature => "Token signature is invalid.".into(),
            Self::ExpiredCredential => "Token expired.".into(),
            Self::NotYetValid => "Token is not valid yet.".into(),
            Self::InvalidIssuer | Self::InvalidAudience => {
                "Incorrect claims. Please, check the audience and issuer.".into()
            }
            Self::MissingClaim(name) => format!("Token is missing the '{name}' claim."),
            Self::PermissionsClaimMissing => "Permissions not included in token.".into(),
            Self::InsufficientPermission { required, .. } => {
                format!("Permission '{required}' is required.")
            }
        }
    }

    /// Infrastructure failures; everything else is client-correctable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::KeySourceUnavailable)
    }
}
