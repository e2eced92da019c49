/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use anyhow::Context;

use crate::config::AuthConfig;
use crate::services::auth::{AuthService, CredentialValidator, JwksCache};

pub fn build_auth_service(config: &AuthConfig) -> anyhow::Result<Arc<AuthService>> {
    let keys = JwksCache::from_url(config.jwks_url.clone(), config.jwks_timeout)
        .context("failed to build key set http client")?;

    let validator = CredentialValidator::new(Arc::new(keys), config.algorithm, config.leeway_seconds);

    tracing::info!(
        issuer = %config.issuer,
        audience = %config.audience,
        algorithm = ?validator.algorithm(),
        jwks_url = %config.jwks_url,
        "bearer token verification configured"
    );

    Ok(Arc::new(AuthService::new(
        validator,
        &config.issuer,
        &config.audience,
    )))
}
