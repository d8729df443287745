use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;

use super::{NewToken, PostStore, StoreError, TaskStore, TokenRecord, TokenStore, UserStore};
use crate::models::{Credentials, NewPost, NewTask, NewUser, Post, PostUpdate, Task, User};

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, user_id, name, token_hash, created_at, expires_at";
const POST_COLUMNS: &str = "id, title, content, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, is_completed, created_at, updated_at";

/// Converts `sqlx::Error` into `StoreError`.
///
/// Unique violations become `Duplicate` so the caller never has to check before inserting.
/// `field` names the column behind the only unique constraint the statement can hit.
fn store_error(error: sqlx::Error, field: &'static str) -> StoreError {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(field),
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        other => StoreError::Database(other.to_string()),
    }
}

/// Postgres-backed store over a `PgPool`. Every call is bounded by `timeout`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Opens a pool whose acquire timeout matches the per-call bound.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, timeout))
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, field: &'static str, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(|e| store_error(e, field)),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        self.bounded(
            "email",
            sqlx::query_as::<_, User>(&sql)
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE email = $1",
            USER_COLUMNS
        );
        self.bounded(
            "email",
            sqlx::query_as::<_, Credentials>(&sql)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        self.bounded(
            "id",
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert(&self, token: NewToken) -> Result<TokenRecord, StoreError> {
        let sql = format!(
            "INSERT INTO personal_access_tokens (user_id, name, token_hash) \
             VALUES ($1, $2, $3) RETURNING {}",
            TOKEN_COLUMNS
        );
        self.bounded(
            "token",
            sqlx::query_as::<_, TokenRecord>(&sql)
                .bind(token.user_id)
                .bind(&token.name)
                .bind(&token.token_hash)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find(&self, id: i64) -> Result<Option<TokenRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM personal_access_tokens WHERE id = $1",
            TOKEN_COLUMNS
        );
        self.bounded(
            "token",
            sqlx::query_as::<_, TokenRecord>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<TokenRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM personal_access_tokens WHERE token_hash = $1",
            TOKEN_COLUMNS
        );
        self.bounded(
            "token",
            sqlx::query_as::<_, TokenRecord>(&sql)
                .bind(token_hash)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete(&self, id: i64, token_hash: &str) -> Result<bool, StoreError> {
        let result = self
            .bounded(
                "token",
                sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1 AND token_hash = $2")
                    .bind(id)
                    .bind(token_hash)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let sql = format!("SELECT {} FROM posts ORDER BY id", POST_COLUMNS);
        self.bounded(
            "id",
            sqlx::query_as::<_, Post>(&sql).fetch_all(&self.pool),
        )
        .await
    }

    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let sql = format!(
            "INSERT INTO posts (title, content) VALUES ($1, $2) RETURNING {}",
            POST_COLUMNS
        );
        self.bounded(
            "id",
            sqlx::query_as::<_, Post>(&sql)
                .bind(&post.title)
                .bind(&post.content)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        self.bounded(
            "id",
            sqlx::query_as::<_, Post>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update(&self, id: i64, update: PostUpdate) -> Result<Option<Post>, StoreError> {
        let sql = format!(
            "UPDATE posts SET title = COALESCE($1, title), content = COALESCE($2, content), \
             updated_at = NOW() WHERE id = $3 RETURNING {}",
            POST_COLUMNS
        );
        self.bounded(
            "id",
            sqlx::query_as::<_, Post>(&sql)
                .bind(&update.title)
                .bind(&update.content)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = self
            .bounded(
                "id",
                sqlx::query("DELETE FROM posts WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS);
        self.bounded(
            "id",
            sqlx::query_as::<_, Task>(&sql).fetch_all(&self.pool),
        )
        .await
    }

    async fn list_pending(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE is_completed = FALSE ORDER BY id",
            TASK_COLUMNS
        );
        self.bounded(
            "id",
            sqlx::query_as::<_, Task>(&sql).fetch_all(&self.pool),
        )
        .await
    }

    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let sql = format!(
            "INSERT INTO tasks (title, is_completed) VALUES ($1, $2) RETURNING {}",
            TASK_COLUMNS
        );
        self.bounded(
            "id",
            sqlx::query_as::<_, Task>(&sql)
                .bind(&task.title)
                .bind(task.is_completed)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        self.bounded(
            "id",
            sqlx::query_as::<_, Task>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn set_completed(
        &self,
        id: i64,
        is_completed: bool,
    ) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "UPDATE tasks SET is_completed = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            TASK_COLUMNS
        );
        self.bounded(
            "id",
            sqlx::query_as::<_, Task>(&sql)
                .bind(is_completed)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = self
            .bounded(
                "id",
                sqlx::query("DELETE FROM tasks WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
