//! Persistence seams.
//!
//! Handlers and services only see these traits. [`postgres::PgStore`] is the production
//! backend; [`memory::MemoryStore`] keeps everything in process and backs the test-suite
//! and `DATABASE_URL=memory` runs. Both enforce email uniqueness and single-row token
//! deletion inside the store itself.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;

use crate::models::{Credentials, NewPost, NewTask, NewUser, Post, PostUpdate, Task, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the offending field.
    Duplicate(&'static str),
    /// The store did not answer within the configured bound.
    Timeout,
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Duplicate(field) => write!(f, "duplicate value for {}", field),
            StoreError::Timeout => write!(f, "store call timed out"),
            StoreError::Database(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// A persisted access token. Only the SHA-256 digest of the secret is kept.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }
}

#[derive(Debug, Clone)]
pub struct NewToken {
    pub user_id: i64,
    pub name: String,
    pub token_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user, failing with `Duplicate("email")` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Credentials>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: NewToken) -> Result<TokenRecord, StoreError>;
    async fn find(&self, id: i64) -> Result<Option<TokenRecord>, StoreError>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<TokenRecord>, StoreError>;
    /// Deletes the row matching both id and digest. Returns whether a row was removed.
    async fn delete(&self, id: i64, token_hash: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Post>, StoreError>;
    async fn create(&self, post: NewPost) -> Result<Post, StoreError>;
    async fn get(&self, id: i64) -> Result<Option<Post>, StoreError>;
    async fn update(&self, id: i64, update: PostUpdate) -> Result<Option<Post>, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, StoreError>;
    async fn list_pending(&self) -> Result<Vec<Task>, StoreError>;
    async fn create(&self, task: NewTask) -> Result<Task, StoreError>;
    async fn get(&self, id: i64) -> Result<Option<Task>, StoreError>;
    async fn set_completed(&self, id: i64, is_completed: bool)
        -> Result<Option<Task>, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}
