//! Structural, signature and claim validation of bearer tokens.
//!
//! The header is inspected by hand before any key lookup so that `none`/HMAC
//! tokens are turned away as `UnsupportedAlgorithm` and never reach the key
//! cache. Signature verification is delegated to `jsonwebtoken`; the
//! time/issuer/audience checks are done here so each failure keeps its own
//! error kind.

use std::str::FromStr;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::Deserialize;
use serde_json::Value;

use super::error::AuthError;
use super::jwks::JwksCache;

/// Claims of a token that passed signature, expiry, issuer and audience checks.
#[derive(Debug, Clone)]
pub struct ValidatedClaims {
    pub subject: String,
    pub expires_at: i64,
    /// The full payload, including provider-specific claims.
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CredentialValidator {
    keys: Arc<JwksCache>,
    algorithm: Algorithm,
    leeway_seconds: u64,
    // Signature-only: claim checks run afterwards in `check_claims`.
    signature_validation: Validation,
}

impl CredentialValidator {
    pub fn new(keys: Arc<JwksCache>, algorithm: Algorithm, leeway_seconds: u64) -> Self {
        let mut signature_validation = Validation::new(algorithm);
        signature_validation.validate_exp = false;
        signature_validation.validate_nbf = false;
        signature_validation.validate_aud = false;
        signature_validation.required_spec_claims.clear();

        Self {
            keys,
            algorithm,
            leeway_seconds,
            signature_validation,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub async fn validate(
        &self,
        token: &str,
        expected_issuer: &str,
        expected_audience: &str,
    ) -> Result<ValidatedClaims, AuthError> {
        // 1) structure
        let header = parse_structure(token)?;

        // 2) algorithm + key id
        let declared = Algorithm::from_str(&header.alg).map_err(|_| {
            tracing::warn!(alg = %header.alg, "token declares an unknown algorithm");
            AuthError::UnsupportedAlgorithm
        })?;
        if declared != self.algorithm {
            tracing::warn!(alg = ?declared, "token declares an untrusted algorithm");
            return Err(AuthError::UnsupportedAlgorithm);
        }
        let kid = header
            .kid
            .filter(|k| !k.is_empty())
            .ok_or(AuthError::MalformedCredential("token header has no key id"))?;

        // 3) key
        let key = self.keys.resolve(&kid).await?;
        if key.algorithm.is_some_and(|alg| alg != self.algorithm) {
            tracing::warn!(
                kid = %kid,
                key_alg = ?key.algorithm,
                "published key is for another algorithm"
            );
            return Err(AuthError::UnsupportedAlgorithm);
        }

        // 4) signature
        let data = jsonwebtoken::decode::<Value>(token, &key.key, &self.signature_validation)
            .map_err(map_decode_error)?;

        // 5) claims
        self.check_claims(
            data.claims,
            expected_issuer,
            expected_audience,
            chrono::Utc::now().timestamp(),
        )
    }

    fn check_claims(
        &self,
        raw: Value,
        expected_issuer: &str,
        expected_audience: &str,
        now: i64,
    ) -> Result<ValidatedClaims, AuthError> {
        let leeway = i64::try_from(self.leeway_seconds).unwrap_or(i64::MAX);

        let expires_at = numeric_claim(&raw, "exp").ok_or(AuthError::MissingClaim("exp"))?;
        if expires_at.saturating_add(leeway) <= now {
            return Err(AuthError::ExpiredCredential);
        }
        if let Some(not_before) = numeric_claim(&raw, "nbf")
            && not_before > now.saturating_add(leeway)
        {
            return Err(AuthError::NotYetValid);
        }

        let issuer = raw
            .get("iss")
            .and_then(Value::as_str)
            .ok_or(AuthError::MissingClaim("iss"))?;
        if issuer != expected_issuer {
            tracing::warn!(iss = %issuer, "token issuer does not match");
            return Err(AuthError::InvalidIssuer);
        }

        let audience = audience_claim(&raw).ok_or(AuthError::MissingClaim("aud"))?;
        if !audience.iter().any(|aud| aud == expected_audience) {
            tracing::warn!(aud = ?audience, "token audience does not match");
            return Err(AuthError::InvalidAudience);
        }

        let subject = raw
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or(AuthError::MissingClaim("sub"))?
            .to_string();

        Ok(ValidatedClaims {
            subject,
            expires_at,
            raw,
        })
    }
}

fn parse_structure(token: &str) -> Result<TokenHeader, AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedCredential(
            "token must have three segments",
        ));
    };

    if header.is_empty() || payload.is_empty() {
        return Err(AuthError::MalformedCredential("token segment is empty"));
    }

    let header: TokenHeader = URL_SAFE_NO_PAD
        .decode(header)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(AuthError::MalformedCredential("token header is not decodable"))?;

    let payload_is_object = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .is_some_and(|v| v.is_object());
    if !payload_is_object {
        return Err(AuthError::MalformedCredential(
            "token payload is not decodable",
        ));
    }

    URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::MalformedCredential("token signature is not decodable"))?;

    Ok(header)
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
            AuthError::UnsupportedAlgorithm
        }
        // Encoding problems are caught by `parse_structure`; this is what is left.
        ErrorKind::InvalidToken => AuthError::MalformedCredential("token is not decodable"),
        _ => {
            tracing::warn!(error = ?err, "token verification failed");
            AuthError::InvalidSignature
        }
    }
}

fn numeric_claim(raw: &Value, name: &str) -> Option<i64> {
    let value = raw.get(name)?;
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

// `aud` may be a single string or an array of strings.
fn audience_claim(raw: &Value) -> Option<Vec<String>> {
    match raw.get("aud")? {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::test_support::{
        AUDIENCE, ISSUER, SIGNING_KID, claims, jwks_document, jwks_url, mount_jwks, now,
        rogue_key, rs256_header, sign_with, signing_key, token,
    };
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::MockServer;

    async fn validator(server: &MockServer, leeway_seconds: u64) -> CredentialValidator {
        let cache = JwksCache::from_url(jwks_url(server), Duration::from_secs(2)).unwrap();
        CredentialValidator::new(Arc::new(cache), Algorithm::RS256, leeway_seconds)
    }

    async fn served(calls: u64) -> (MockServer, CredentialValidator) {
        let server = MockServer::start().await;
        mount_jwks(&server, jwks_document(), calls).await;
        let validator = validator(&server, 0).await;
        (server, validator)
    }

    fn encode_segment(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    #[tokio::test]
    async fn accepts_a_valid_token() {
        let (_server, validator) = served(1).await;

        let validated = validator
            .validate(&token(&claims(&["view:actor"])), ISSUER, AUDIENCE)
            .await
            .unwrap();

        assert_eq!(validated.subject, "auth0|5f2a9c1e7d");
        assert_eq!(validated.raw["iss"], ISSUER);
        assert_eq!(validated.raw["aud"][0], AUDIENCE);
        assert_eq!(validated.raw["permissions"], json!(["view:actor"]));
    }

    #[tokio::test]
    async fn accepts_single_string_audience() {
        let (_server, validator) = served(1).await;
        let mut payload = claims(&[]);
        payload["aud"] = json!(AUDIENCE);

        let validated = validator
            .validate(&token(&payload), ISSUER, AUDIENCE)
            .await
            .unwrap();
        assert_eq!(validated.subject, "auth0|5f2a9c1e7d");
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let (_server, validator) = served(1).await;
        let mut payload = claims(&["view:actor"]);
        payload["exp"] = json!(now() - 1);

        let err = validator
            .validate(&token(&payload), ISSUER, AUDIENCE)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredCredential));
    }

    #[tokio::test]
    async fn leeway_tolerates_small_clock_skew() {
        let server = MockServer::start().await;
        mount_jwks(&server, jwks_document(), 1).await;
        let validator = validator(&server, 60).await;
        let mut payload = claims(&[]);
        payload["exp"] = json!(now() - 30);

        assert!(validator.validate(&token(&payload), ISSUER, AUDIENCE).await.is_ok());
    }

    // Claim checks with a pinned clock; the cache is never consulted.
    fn offline_validator(leeway_seconds: u64) -> CredentialValidator {
        let url = url::Url::parse("http://127.0.0.1:9/.well-known/jwks.json").unwrap();
        let cache = JwksCache::from_url(url, Duration::from_secs(1)).unwrap();
        CredentialValidator::new(Arc::new(cache), Algorithm::RS256, leeway_seconds)
    }

    const NOW: i64 = 1_700_000_000;

    fn expiring_at(exp: i64) -> Value {
        let mut payload = claims(&["view:actor"]);
        payload["exp"] = json!(exp);
        payload
    }

    #[test]
    fn expiry_equal_to_now_is_expired() {
        let err = offline_validator(0)
            .check_claims(expiring_at(NOW), ISSUER, AUDIENCE, NOW)
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredCredential));
    }

    #[test]
    fn expiry_one_second_ahead_is_accepted() {
        let validated = offline_validator(0)
            .check_claims(expiring_at(NOW + 1), ISSUER, AUDIENCE, NOW)
            .unwrap();
        assert_eq!(validated.expires_at, NOW + 1);
    }

    #[test]
    fn leeway_boundary_is_exclusive() {
        let validator = offline_validator(30);

        let err = validator
            .check_claims(expiring_at(NOW - 30), ISSUER, AUDIENCE, NOW)
            .unwrap_err();
        assert!(matches!(err, AuthError::ExpiredCredential));

        assert!(
            validator
                .check_claims(expiring_at(NOW - 29), ISSUER, AUDIENCE, NOW)
                .is_ok()
        );
    }

    #[tokio::test]
    async fn rejects_token_not_valid_yet() {
        let (_server, validator) = served(1).await;
        let mut payload = claims(&[]);
        payload["nbf"] = json!(now() + 600);

        let err = validator
            .validate(&token(&payload), ISSUER, AUDIENCE)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotYetValid));
    }

    #[tokio::test]
    async fn rejects_wrong_issuer_and_audience() {
        let (_server, validator) = served(1).await;

        let mut payload = claims(&["view:actor"]);
        payload["iss"] = json!("https://evil.example.com/");
        let err = validator
            .validate(&token(&payload), ISSUER, AUDIENCE)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidIssuer));

        let mut payload = claims(&["view:actor"]);
        payload["aud"] = json!(["another-api"]);
        let err = validator
            .validate(&token(&payload), ISSUER, AUDIENCE)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidAudience));
    }

    #[tokio::test]
    async fn reports_missing_registered_claims() {
        let (_server, validator) = served(1).await;

        for name in ["exp", "iss", "aud", "sub"] {
            let mut payload = claims(&[]);
            payload.as_object_mut().unwrap().remove(name);

            let err = validator
                .validate(&token(&payload), ISSUER, AUDIENCE)
                .await
                .unwrap_err();
            assert!(
                matches!(err, AuthError::MissingClaim(claim) if claim == name),
                "{name}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn rejects_hmac_token_without_fetching_keys() {
        let (_server, validator) = served(0).await;
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(SIGNING_KID.to_string());
        let hmac = sign_with(&header, &EncodingKey::from_secret(b"guessable"), &claims(&[]));

        let err = validator.validate(&hmac, ISSUER, AUDIENCE).await.unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedAlgorithm));
    }

    #[tokio::test]
    async fn rejects_unsigned_token() {
        let (_server, validator) = served(0).await;
        let unsigned = format!(
            "{}.{}.",
            encode_segment(&json!({ "alg": "none", "typ": "JWT", "kid": SIGNING_KID })),
            encode_segment(&claims(&["delete:actor"])),
        );

        let err = validator.validate(&unsigned, ISSUER, AUDIENCE).await.unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedAlgorithm));
    }

    #[tokio::test]
    async fn rejects_token_signed_by_another_key() {
        let (_server, validator) = served(1).await;
        let forged = sign_with(&rs256_header(SIGNING_KID), &rogue_key(), &claims(&[]));

        let err = validator.validate(&forged, ISSUER, AUDIENCE).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn rejects_tampered_payload() {
        let (_server, validator) = served(1).await;
        let signed = token(&claims(&["view:actor"]));
        let segments: Vec<&str> = signed.split('.').collect();
        let tampered = format!(
            "{}.{}.{}",
            segments[0],
            encode_segment(&claims(&["view:actor", "delete:actor"])),
            segments[2]
        );

        let err = validator.validate(&tampered, ISSUER, AUDIENCE).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn rejects_malformed_tokens() {
        let (_server, validator) = served(0).await;
        let payload = encode_segment(&claims(&[]));
        let header = encode_segment(&json!({ "alg": "RS256", "kid": SIGNING_KID }));

        for raw in [
            "not-a-token".to_string(),
            "a.b".to_string(),
            format!("{header}.{payload}.c2ln.extra"),
            format!(".{payload}.c2ln"),
            format!("{header}..c2ln"),
            format!("!!!.{payload}.c2ln"),
            format!("{header}.{}.c2ln", URL_SAFE_NO_PAD.encode(b"[1,2,3]")),
            format!("{header}.{payload}.***"),
        ] {
            let err = validator.validate(&raw, ISSUER, AUDIENCE).await.unwrap_err();
            assert!(
                matches!(err, AuthError::MalformedCredential(_)),
                "{raw}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn rejects_token_without_key_id() {
        let (_server, validator) = served(0).await;
        let no_kid = sign_with(&Header::new(Algorithm::RS256), &signing_key(), &claims(&[]));

        let err = validator.validate(&no_kid, ISSUER, AUDIENCE).await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredential(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_key_id() {
        let (_server, validator) = served(1).await;
        let unknown = sign_with(&rs256_header("retired-key"), &signing_key(), &claims(&[]));

        let err = validator.validate(&unknown, ISSUER, AUDIENCE).await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownSigningKey));
    }
}
