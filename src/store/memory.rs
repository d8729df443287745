use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{NewToken, PostStore, StoreError, TaskStore, TokenRecord, TokenStore, UserStore};
use crate::models::{Credentials, NewPost, NewTask, NewUser, Post, PostUpdate, Task, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, Credentials>,
    emails: HashMap<String, i64>,
    tokens: HashMap<i64, TokenRecord>,
    posts: BTreeMap<i64, Post>,
    tasks: BTreeMap<i64, Task>,
    next_user_id: i64,
    next_token_id: i64,
    next_post_id: i64,
    next_task_id: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// In-process store. Every operation runs under one lock, so check-and-insert and
/// delete are atomic exactly as they are in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables()?;
        if tables.emails.contains_key(&user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        let id = next(&mut tables.next_user_id);
        let now = Utc::now();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            created_at: now,
            updated_at: now,
        };
        tables.emails.insert(created.email.clone(), id);
        tables.users.insert(
            id,
            Credentials {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.get(&id).map(|c| c.user.clone()))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: NewToken) -> Result<TokenRecord, StoreError> {
        let mut tables = self.tables()?;
        if tables.tokens.values().any(|t| t.token_hash == token.token_hash) {
            return Err(StoreError::Duplicate("token"));
        }
        let record = TokenRecord {
            id: next(&mut tables.next_token_id),
            user_id: token.user_id,
            name: token.name,
            token_hash: token.token_hash,
            created_at: Utc::now(),
            expires_at: None,
        };
        tables.tokens.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: i64) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self.tables()?.tokens.get(&id).cloned())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self
            .tables()?
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn delete(&self, id: i64, token_hash: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        match tables.tokens.get(&id) {
            Some(record) if record.token_hash == token_hash => {
                tables.tokens.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.tables()?.posts.values().cloned().collect())
    }

    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut tables = self.tables()?;
        let now = Utc::now();
        let created = Post {
            id: next(&mut tables.next_post_id),
            title: post.title,
            content: post.content,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Post>, StoreError> {
        Ok(self.tables()?.posts.get(&id).cloned())
    }

    async fn update(&self, id: i64, update: PostUpdate) -> Result<Option<Post>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables.posts.get_mut(&id).map(|post| {
            post.apply(update);
            post.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables()?.posts.remove(&id).is_some())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tables()?.tasks.values().cloned().collect())
    }

    async fn list_pending(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tables()?
            .tasks
            .values()
            .filter(|t| !t.is_completed)
            .cloned()
            .collect())
    }

    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut tables = self.tables()?;
        let now = Utc::now();
        let created = Task {
            id: next(&mut tables.next_task_id),
            title: task.title,
            is_completed: task.is_completed,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.tables()?.tasks.get(&id).cloned())
    }

    async fn set_completed(
        &self,
        id: i64,
        is_completed: bool,
    ) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables.tasks.get_mut(&id).map(|task| {
            task.is_completed = is_completed;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables()?.tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice Smith".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let first = UserStore::create(&store, new_user("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(first.id, 1);

        let second = UserStore::create(&store, new_user("alice@example.com")).await;
        assert_eq!(second.unwrap_err(), StoreError::Duplicate("email"));

        let found = store.find_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.user, first);
        assert_eq!(store.find_by_id(first.id).await.unwrap(), Some(first));
        assert!(store.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_delete_needs_matching_hash_and_happens_once() {
        let store = MemoryStore::new();
        let record = store
            .insert(NewToken {
                user_id: 1,
                name: "api_token".into(),
                token_hash: "abc".into(),
            })
            .await
            .unwrap();

        assert!(!TokenStore::delete(&store, record.id, "other").await.unwrap());
        assert!(store.find_by_hash("abc").await.unwrap().is_some());
        assert!(TokenStore::delete(&store, record.id, "abc").await.unwrap());
        assert!(!TokenStore::delete(&store, record.id, "abc").await.unwrap());
        assert!(store.find(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_list_tracks_completion() {
        let store = MemoryStore::new();
        let task = TaskStore::create(
            &store,
            NewTask {
                title: "Buy milk".into(),
                is_completed: false,
            },
        )
        .await
        .unwrap();
        TaskStore::create(
            &store,
            NewTask {
                title: "Done already".into(),
                is_completed: true,
            },
        )
        .await
        .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending, vec![task.clone()]);

        let updated = store.set_completed(task.id, true).await.unwrap().unwrap();
        assert!(updated.is_completed);
        assert!(store.list_pending().await.unwrap().is_empty());
        assert!(store.set_completed(42, true).await.unwrap().is_none());
    }
}
