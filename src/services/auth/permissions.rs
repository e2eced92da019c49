/*
 * Responsibility
 * - Closed set of permission literals a route can require (`action:resource`)
 * - Read the `permissions` claim of a validated token into a set
 */
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::error::AuthError;
use super::validator::ValidatedClaims;

/// Name of the claim the identity provider fills with RBAC permissions.
pub const PERMISSIONS_CLAIM: &str = "permissions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    ViewActor,
    ViewMovie,
    PostActor,
    PostMovie,
    PatchActor,
    PatchMovie,
    DeleteActor,
    DeleteMovie,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Self::ViewActor,
        Self::ViewMovie,
        Self::PostActor,
        Self::PostMovie,
        Self::PatchActor,
        Self::PatchMovie,
        Self::DeleteActor,
        Self::DeleteMovie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewActor => "view:actor",
            Self::ViewMovie => "view:movie",
            Self::PostActor => "post:actor",
            Self::PostMovie => "post:movie",
            Self::PatchActor => "patch:actor",
            Self::PatchMovie => "patch:movie",
            Self::DeleteActor => "delete:actor",
            Self::DeleteMovie => "delete:movie",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownPermission(pub String);

impl fmt::Display for UnknownPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown permission: {}", self.0)
    }
}

impl std::error::Error for UnknownPermission {}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Collect the granted permissions of a validated token.
///
/// The set keeps every string the provider granted, including ones this service
/// has no route for; membership checks compare against `Permission::as_str`.
/// An empty array is valid and grants nothing.
pub fn extract(claims: &ValidatedClaims) -> Result<BTreeSet<String>, AuthError> {
    let claim = claims
        .raw
        .get(PERMISSIONS_CLAIM)
        .ok_or(AuthError::PermissionsClaimMissing)?;

    let Value::Array(items) = claim else {
        tracing::warn!(claim = %claim, "permissions claim is not an array");
        return Err(AuthError::PermissionsClaimMissing);
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => {
                if s.parse::<Permission>().is_err() {
                    tracing::debug!(grant = %s, "granted permission matches no route");
                }
                Ok(s.clone())
            }
            other => {
                tracing::warn!(entry = %other, "permissions claim holds a non-string entry");
                Err(AuthError::PermissionsClaimMissing)
            }
        })
        .collect()
}
