//! `Authorization: Bearer <token>` parsing. No I/O.

use axum::http::HeaderValue;

use super::error::AuthError;

/// Return the credential embedded in the raw `Authorization` header value.
///
/// The header must hold exactly two whitespace-separated segments, the first
/// being the `Bearer` scheme (ASCII case-insensitive).
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;

    let value = header
        .to_str()
        .map_err(|_| AuthError::MalformedCredential("header is not visible ASCII"))?;

    let mut parts = value.split_whitespace();

    let scheme = parts
        .next()
        .ok_or(AuthError::MalformedCredential("header is empty"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedCredential(
            "header must start with \"Bearer\"",
        ));
    }

    let token = parts
        .next()
        .ok_or(AuthError::MalformedCredential("token not found"))?;

    if parts.next().is_some() {
        return Err(AuthError::MalformedCredential(
            "header must be a single bearer token",
        ));
    }

    Ok(token)
}
