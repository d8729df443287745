//! Opaque bearer tokens.
//!
//! A token handed to a client has the form `{id}|{secret}`, where `secret` is 40 random
//! alphanumeric characters. Only the hex SHA-256 digest of the secret is persisted, so a
//! leaked database row cannot be replayed. A bare secret without the `id|` prefix is
//! accepted as well and looked up by digest.

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;
use crate::store::{NewToken, TokenRecord, TokenStore, UserStore};

/// Length of the random secret (characters). 62^40 is roughly 2^238.
pub const TOKEN_SECRET_LENGTH: usize = 40;

/// Name given to tokens issued by `POST /login`.
pub const LOGIN_TOKEN_NAME: &str = "api_token";

/// Generates a fresh secret from the thread-local CSPRNG.
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Hex-encoded SHA-256 digest of a secret, as stored in `personal_access_tokens`.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// A presented token split into its optional record id and its secret.
#[derive(Debug, PartialEq, Eq)]
pub struct PlainToken<'a> {
    pub id: Option<i64>,
    pub secret: &'a str,
}

/// Splits `raw` into id and secret. Returns `None` for anything that cannot be a token.
pub fn parse_token(raw: &str) -> Option<PlainToken<'_>> {
    let raw = raw.trim();
    match raw.split_once('|') {
        Some((id, secret)) => {
            let id = id.parse::<i64>().ok()?;
            if secret.is_empty() {
                return None;
            }
            Some(PlainToken {
                id: Some(id),
                secret,
            })
        }
        None if raw.is_empty() => None,
        None => Some(PlainToken {
            id: None,
            secret: raw,
        }),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Issues, resolves and revokes tokens on top of a [`TokenStore`].
#[derive(Clone)]
pub struct TokenRegistry {
    tokens: Arc<dyn TokenStore>,
    users: Arc<dyn UserStore>,
}

impl TokenRegistry {
    pub fn new(tokens: Arc<dyn TokenStore>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Persists a new token for `user_id` and returns its plaintext form. The plaintext is
    /// not recoverable afterwards.
    pub async fn issue(&self, user_id: i64, name: &str) -> Result<String, AppError> {
        let secret = generate_secret();
        let record = self
            .tokens
            .insert(NewToken {
                user_id,
                name: name.to_string(),
                token_hash: hash_secret(&secret),
            })
            .await?;
        Ok(format!("{}|{}", record.id, secret))
    }

    async fn lookup(&self, raw: &str) -> Result<Option<(TokenRecord, String)>, AppError> {
        let Some(plain) = parse_token(raw) else {
            return Ok(None);
        };
        let digest = hash_secret(plain.secret);
        let record = match plain.id {
            Some(id) => self.tokens.find(id).await?,
            None => self.tokens.find_by_hash(&digest).await?,
        };
        Ok(record
            .filter(|r| constant_time_eq(r.token_hash.as_bytes(), digest.as_bytes()))
            .filter(|r| !r.is_expired(Utc::now()))
            .map(|r| (r, digest)))
    }

    /// Returns the owner of a live token, or `None` if the token is unknown, revoked or
    /// expired.
    pub async fn resolve(&self, raw: &str) -> Result<Option<User>, AppError> {
        match self.lookup(raw).await? {
            Some((record, _)) => Ok(self.users.find_by_id(record.user_id).await?),
            None => Ok(None),
        }
    }

    /// Deletes the token. Returns `false` if it was already gone.
    pub async fn revoke(&self, raw: &str) -> Result<bool, AppError> {
        match self.lookup(raw).await? {
            Some((record, digest)) => Ok(self.tokens.delete(record.id, &digest).await?),
            None => Ok(false),
        }
    }
}
