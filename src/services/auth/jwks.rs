//! Process-wide cache of the identity provider's public verification keys.
//!
//! The cache holds an immutable snapshot (`kid -> VerificationKey`) that is
//! replaced wholesale after each successful fetch. Readers never see a
//! half-built key set.
//!
//! Refresh is single-flight: a resolver that misses takes the refresh lock,
//! and if another task completed a fetch while it was waiting, it uses that
//! outcome instead of fetching again. N concurrent misses cost one request to
//! the key source.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, jwk::Jwk};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use super::error::AuthError;

/// JSON document served by the key-set endpoint. Individual keys stay untyped
/// so one unsupported entry does not poison the whole set.
#[derive(Debug, Deserialize)]
pub struct KeySetDocument {
    pub keys: Vec<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum KeySourceError {
    #[error("key set request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("key set endpoint answered with status {0}")]
    Status(u16),
    #[error("key set body is not a JWKS document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the key set comes from. The HTTP implementation is the only one used
/// in production; the seam keeps the cache independent from transport.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<KeySetDocument, KeySourceError>;
}

/// Fetches the key set from a fixed URL with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, KeySourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<KeySetDocument, KeySourceError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// A public key published by the identity provider.
#[derive(Clone)]
pub struct VerificationKey {
    pub kid: String,
    /// `alg` declared by the key set entry, when present.
    pub algorithm: Option<Algorithm>,
    pub key: DecodingKey,
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl VerificationKey {
    fn from_jwk_value(value: serde_json::Value) -> Option<Self> {
        let kid = value.get("kid")?.as_str()?.to_string();

        let algorithm = match value.get("alg").and_then(|v| v.as_str()) {
            Some(name) => match Algorithm::from_str(name) {
                Ok(alg) => Some(alg),
                Err(_) => {
                    debug!(kid = %kid, alg = %name, "skipping key with unsupported alg");
                    return None;
                }
            },
            None => None,
        };

        let jwk: Jwk = match serde_json::from_value(value) {
            Ok(jwk) => jwk,
            Err(err) => {
                debug!(kid = %kid, error = %err, "skipping unparseable jwk");
                return None;
            }
        };

        match DecodingKey::from_jwk(&jwk) {
            Ok(key) => Some(Self { kid, algorithm, key }),
            Err(err) => {
                debug!(kid = %kid, error = %err, "skipping jwk without usable key material");
                None
            }
        }
    }
}

#[derive(Debug, Default)]
struct KeySnapshot {
    keys: HashMap<String, VerificationKey>,
}

impl KeySnapshot {
    fn from_document(document: KeySetDocument) -> Self {
        let keys = document
            .keys
            .into_iter()
            .filter_map(VerificationKey::from_jwk_value)
            .map(|k| (k.kid.clone(), k))
            .collect();
        Self { keys }
    }

    fn key_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.keys.keys().cloned().collect();
        ids.sort();
        ids
    }
}

pub struct JwksCache {
    source: Arc<dyn KeySource>,
    snapshot: RwLock<Arc<KeySnapshot>>,
    // Completed fetch attempts, successful or not. Only bumped under `refresh`.
    attempts: AtomicU64,
    // Outcome of the latest attempt: true if it failed.
    refresh: Mutex<bool>,
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCache").finish_non_exhaustive()
    }
}

impl JwksCache {
    pub fn new(source: Arc<dyn KeySource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Arc::new(KeySnapshot::default())),
            attempts: AtomicU64::new(0),
            refresh: Mutex::new(false),
        }
    }

    pub fn from_url(url: Url, timeout: Duration) -> Result<Self, KeySourceError> {
        Ok(Self::new(Arc::new(HttpKeySource::new(url, timeout)?)))
    }

    /// Look up `kid`, fetching the key set once if it is not cached.
    pub async fn resolve(&self, kid: &str) -> Result<VerificationKey, AuthError> {
        // Observe the attempt counter before checking the snapshot, so a refresh
        // that lands in between is not mistaken for one we still have to run.
        let seen_attempts = self.attempts.load(Ordering::Acquire);

        if let Some(key) = self.cached(kid).await {
            return Ok(key);
        }

        let mut last_failed = self.refresh.lock().await;

        if self.attempts.load(Ordering::Acquire) == seen_attempts {
            match self.source.fetch().await {
                Ok(document) => {
                    let snapshot = KeySnapshot::from_document(document);
                    info!(kids = ?snapshot.key_ids(), "verification key set refreshed");
                    *self.snapshot.write().await = Arc::new(snapshot);
                    *last_failed = false;
                }
                Err(err) => {
                    warn!(error = %err, "verification key set fetch failed");
                    *last_failed = true;
                }
            }
            self.attempts.fetch_add(1, Ordering::Release);
        }

        if *last_failed {
            return Err(AuthError::KeySourceUnavailable);
        }
        drop(last_failed);

        self.cached(kid).await.ok_or_else(|| {
            warn!(kid = %kid, "token key id not present in refreshed key set");
            AuthError::UnknownSigningKey
        })
    }

    async fn cached(&self, kid: &str) -> Option<VerificationKey> {
        let snapshot = Arc::clone(&*self.snapshot.read().await);
        snapshot.keys.get(kid).cloned()
    }

    #[cfg(test)]
    async fn key_ids(&self) -> Vec<String> {
        self.snapshot.read().await.key_ids()
    }
}
