//! Fixtures shared by the auth tests: an RSA key pair published through a mock
//! JWKS endpoint, and helpers to mint tokens against it.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{AuthService, CredentialValidator, JwksCache};

pub const ISSUER: &str = "https://casting.test.auth0.com/";
pub const AUDIENCE: &str = "casting";
pub const SIGNING_KID: &str = "casting-signing-key";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

const SIGNING_KEY_PEM: &str = include_str!("testdata/signing_key.pem");
const ROGUE_KEY_PEM: &str = include_str!("testdata/rogue_key.pem");

const SIGNING_KEY_N: &str = "xCQd7p61IvdggotxBzGsU0EycHMUN5FCdAebXqHYKxajKcG0VrRqfRNOgUKfrUp3U4RC91yu_TAKo3rjJmLf-v2fZFCTb-1AwrUyuOG5KSUIR1cYz2yD5ks6WEpEkUt1vlZG_h6hMCXYSVf90r72P9KSkgTBjJziZrRPbKYUAIYKw4Rp5_1bsb5YvTiYSun3_p5FjM5TYELa-BM8OzQAkuIMmhsFouO2-JaTuvIbBYwpBNA6Dq6iAz61w0e5bL1QXC_7wbhUmb4YA0J_R5lDpz_YXIyyupMwGWf9v2HPI_fSKAdpF8ipBSnBprCfDbmYym6I4lfU8851HMr8tTDthw";
const ROGUE_KEY_N: &str = "tWirOMAYEiafQThTZb_A9hkLZCO5aEJJKZokpjiEj_h6YEcnGiflEkJwCIWvCss0BILDKoNuYFyx23LuSWBAKIeXgDu-CCCk41F2nmBQps_dlPiXnlDXtXRbLBTtGAv_rn9kMtwDZV7acV8yqrqCzW1vGG57_RnwPWQNNMOWrUc_1vDD-A3Cg-bhX6lcqMPs-G6wZxsoMHdotdbJPYuFWXXZEjVbycsQYMBpydDgj7pzO5_29XVGv1qBKHUsrUeOJhyI63ZKf-uB6PkjRrG_jEUbEN7vje3_u6kOo8I4Y_dBNmQa3O9GLoQqEd_4yMXxcRIdUB6Akg4VjOEd7bcf_Q";
const RSA_E: &str = "AQAB";

fn rsa_jwk(kid: &str, n: &str) -> Value {
    json!({ "kty": "RSA", "use": "sig", "alg": "RS256", "kid": kid, "n": n, "e": RSA_E })
}

pub fn jwks_document() -> Value {
    json!({ "keys": [rsa_jwk(SIGNING_KID, SIGNING_KEY_N)] })
}

/// Key set after the provider rotated to a new key.
pub fn rotated_jwks_document() -> Value {
    json!({ "keys": [rsa_jwk("rotated-key", ROGUE_KEY_N)] })
}

/// Serve `document` at the JWKS path and expect exactly `calls` fetches.
pub async fn mount_jwks(server: &MockServer, document: Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .expect(calls)
        .mount(server)
        .await;
}

pub fn jwks_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}{}", server.uri(), JWKS_PATH)).unwrap()
}

pub fn auth_service(server: &MockServer) -> AuthService {
    let cache = JwksCache::from_url(jwks_url(server), Duration::from_secs(2)).unwrap();
    let validator = CredentialValidator::new(Arc::new(cache), Algorithm::RS256, 0);
    AuthService::new(validator, ISSUER, AUDIENCE)
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims of a token that passes every check, granting `permissions`.
pub fn claims(permissions: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "sub": "auth0|5f2a9c1e7d",
        "aud": [AUDIENCE, "https://casting.test.auth0.com/userinfo"],
        "iat": now() - 60,
        "exp": now() + 3600,
        "permissions": permissions,
    })
}

pub fn signing_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(SIGNING_KEY_PEM.as_bytes()).unwrap()
}

pub fn rogue_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(ROGUE_KEY_PEM.as_bytes()).unwrap()
}

pub fn rs256_header(kid: &str) -> Header {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    header
}

pub fn sign_with(header: &Header, key: &EncodingKey, claims: &Value) -> String {
    jsonwebtoken::encode(header, claims, key).unwrap()
}

/// RS256 token signed by the published key.
pub fn token(claims: &Value) -> String {
    sign_with(&rs256_header(SIGNING_KID), &signing_key(), claims)
}

pub fn bearer(token: &str) -> axum::http::HeaderValue {
    axum::http::HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}
