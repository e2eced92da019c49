/*
 * Responsibility
 * - Load settings from the environment (DATABASE_URL, CORS allowlist, Auth trust parameters, ...)
 * - Validate them once at startup (missing/invalid -> fail to boot)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Trust parameters for bearer tokens issued by the external identity provider.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
    pub jwks_url: Url,
    pub jwks_timeout: Duration,
    pub leeway_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub http: HttpConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Reads the process environment. Load `.env` beforehand if wanted.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = parse_or("PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = required("DATABASE_URL")?;
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 5)?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let http = HttpConfig {
            request_timeout: Duration::from_secs(parse_or("HTTP_REQUEST_TIMEOUT_SECONDS", 30)?),
            body_limit_bytes: parse_or("HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?,
        };

        let issuer = required("AUTH_ISSUER")?;
        let audience = required("AUTH_AUDIENCE")?;
        let algorithm = trusted_algorithm(
            &std::env::var("AUTH_ALGORITHM").unwrap_or_else(|_| "RS256".to_string()),
        )?;
        let jwks_url = match std::env::var("AUTH_JWKS_URL") {
            Ok(raw) => Url::parse(&raw).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?,
            Err(_) => default_jwks_url(&issuer)?,
        };

        let auth = AuthConfig {
            issuer,
            audience,
            algorithm,
            jwks_url,
            jwks_timeout: Duration::from_secs(parse_or("AUTH_JWKS_TIMEOUT_SECONDS", 5)?),
            leeway_seconds: parse_or("ACCESS_TOKEN_LEEWAY_SECONDS", 0)?,
        };

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            app_env,
            cors_allowed_origins,
            http,
            auth,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Only asymmetric algorithms can be trusted: the verifier holds public keys only,
/// and an HMAC "key" published in a key set would let anyone mint tokens.
pub fn trusted_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm =
        Algorithm::from_str(name.trim()).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHM"))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(ConfigError::Invalid("AUTH_ALGORITHM"))
        }
        other => Ok(other),
    }
}

fn default_jwks_url(issuer: &str) -> Result<Url, ConfigError> {
    let base = format!("{}/", issuer.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|u| u.join(".well-known/jwks.json"))
        .map_err(|_| ConfigError::Invalid("AUTH_ISSUER"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_asymmetric_algorithms() {
        assert_eq!(trusted_algorithm("RS256").unwrap(), Algorithm::RS256);
        assert_eq!(trusted_algorithm(" ES256 ").unwrap(), Algorithm::ES256);
        assert_eq!(trusted_algorithm("EdDSA").unwrap(), Algorithm::EdDSA);
    }

    #[test]
    fn rejects_symmetric_and_unknown_algorithms() {
        for name in ["HS256", "HS384", "HS512", "none", "", "rs256x"] {
            assert!(
                matches!(
                    trusted_algorithm(name),
                    Err(ConfigError::Invalid("AUTH_ALGORITHM"))
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn jwks_url_defaults_to_well_known_path_under_issuer() {
        let with_slash = default_jwks_url("https://casting.eu.auth0.com/").unwrap();
        let without_slash = default_jwks_url("https://casting.eu.auth0.com").unwrap();

        assert_eq!(
            with_slash.as_str(),
            "https://casting.eu.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn jwks_url_rejects_non_url_issuer() {
        assert!(matches!(
            default_jwks_url("casting-issuer"),
            Err(ConfigError::Invalid("AUTH_ISSUER"))
        ));
    }
}
