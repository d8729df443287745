use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::AppError;
use crate::store::memory::MemoryStore;
use crate::store::{PostStore, TaskStore, TokenStore, UserStore};

/// Shared, read-only handles registered once as `web::Data<AppState>`.
/// All mutable state lives behind the stores.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub posts: Arc<dyn PostStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl AppState {
    /// Builds the state from one backend implementing every store trait.
    pub fn from_store<S>(store: Arc<S>, bcrypt_cost: u32) -> Result<Self, AppError>
    where
        S: UserStore + TokenStore + PostStore + TaskStore + 'static,
    {
        Ok(Self {
            auth: AuthService::new(store.clone(), store.clone(), bcrypt_cost)?,
            posts: store.clone(),
            tasks: store,
        })
    }

    pub fn in_memory(bcrypt_cost: u32) -> Result<Self, AppError> {
        Self::from_store(Arc::new(MemoryStore::new()), bcrypt_cost)
    }
}
