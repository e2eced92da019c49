/*
 * Responsibility
 * - The authenticated caller as handlers see it
 * - Built only by AuthService::enforce after every check passed; lives for one request
 */
use std::collections::BTreeSet;

use serde_json::Value;

use super::permissions::Permission;

#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    /// `sub` of the token (e.g. `auth0|5f2a9c1e7d`).
    pub subject: String,
    /// Every permission string the token grants.
    pub permissions: BTreeSet<String>,
    /// `exp` of the token, seconds since the epoch.
    pub expires_at: i64,
    /// Raw claim payload, including provider-specific claims.
    pub claims: Value,
}

impl Principal {
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(permission.as_str())
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}
