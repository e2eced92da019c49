use axum::http::HeaderValue;

use super::bearer::bearer_token;
use super::error::AuthError;
use super::permissions::{self, Permission};
use super::principal::Principal;
use super::validator::CredentialValidator;

/// Bearer-token verifier + permission gate used by every protected handler.
///
/// - Trust parameters (issuer/audience) are fixed at construction.
/// - Key material lives in the shared `JwksCache` behind the validator.
#[derive(Clone, Debug)]
pub struct AuthService {
    validator: CredentialValidator,
    issuer: String,
    audience: String,
}

impl AuthService {
    pub fn new(
        validator: CredentialValidator,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Authenticate the request and require `required`.
    ///
    /// Runs header extraction, token validation and permission extraction in
    /// order and returns the first failure unchanged. Call it before any
    /// business logic of the handler.
    pub async fn enforce(
        &self,
        required: Permission,
        authorization: Option<&HeaderValue>,
    ) -> Result<Principal, AuthError> {
        let result = self.authorize(required, authorization).await;

        match &result {
            Ok(principal) => {
                tracing::debug!(
                    sub = %principal.subject,
                    azp = ?principal.claim("azp"),
                    exp = principal.expires_at,
                    permission = %required,
                    "request authorized"
                );
            }
            Err(AuthError::InsufficientPermission { granted, .. }) => {
                tracing::warn!(permission = %required, "permission not granted");
                tracing::debug!(permission = %required, granted = ?granted, "granted permissions");
            }
            Err(err) if err.is_transient() => {
                tracing::error!(
                    error = %err,
                    permission = %required,
                    "request could not be verified"
                );
            }
            Err(err) => {
                tracing::warn!(
                    code = err.code(),
                    error = %err,
                    permission = %required,
                    "request rejected"
                );
            }
        }

        result
    }

    async fn authorize(
        &self,
        required: Permission,
        authorization: Option<&HeaderValue>,
    ) -> Result<Principal, AuthError> {
        let token = bearer_token(authorization)?;

        let claims = self
            .validator
            .validate(token, &self.issuer, &self.audience)
            .await?;

        let principal = Principal {
            permissions: permissions::extract(&claims)?,
            subject: claims.subject,
            expires_at: claims.expires_at,
            claims: claims.raw,
        };

        if !principal.has(required) {
            return Err(AuthError::InsufficientPermission {
                required,
                granted: principal.permissions,
            });
        }

        Ok(principal)
    }
}
