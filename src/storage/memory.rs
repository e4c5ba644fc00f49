//! In-process store
//!
//! Committed users live behind one lock with unique indexes on lower-cased
//! email and on username. Sessions stage writes locally and re-check both
//! indexes under the write lock at commit.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{normalize_email, FieldErrors, User};
use crate::error::{AppError, AppResult};

use super::{Session, Store, UserRepository};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_username: HashMap<String, Uuid>,
}

impl MemoryState {
    fn find_by_email(&self, key: &str) -> Option<&User> {
        self.by_email.get(key).and_then(|id| self.users.get(id))
    }

    fn find_by_username(&self, username: &str) -> Option<&User> {
        self.by_username.get(username).and_then(|id| self.users.get(id))
    }
}

/// Shared in-memory store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed users
    pub async fn len(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Committed lookup outside any session
    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let key = normalize_email(email);
        self.state.read().await.find_by_email(&key).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn Session>> {
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
        }))
    }
}

/// Session with locally staged inserts
struct MemorySession {
    state: Arc<RwLock<MemoryState>>,
    staged: Vec<User>,
}

#[async_trait]
impl UserRepository for MemorySession {
    async fn find_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        let key = normalize_email(email);
        if let Some(user) = self.staged.iter().find(|u| u.email_key() == key) {
            return Ok(Some(user.clone()));
        }
        Ok(self.state.read().await.find_by_email(&key).cloned())
    }

    async fn find_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        if let Some(user) = self.staged.iter().find(|u| u.username == username) {
            return Ok(Some(user.clone()));
        }
        Ok(self.state.read().await.find_by_username(username).cloned())
    }

    async fn create(&mut self, user: &User) -> AppResult<()> {
        self.staged.push(user.clone());
        Ok(())
    }
}

#[async_trait]
impl Session for MemorySession {
    fn repository(&mut self) -> &mut dyn UserRepository {
        self
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemorySession { state: shared, staged } = *self;
        let mut state = shared.write().await;

        let mut conflicts = FieldErrors::new();
        let mut emails: Vec<String> = Vec::with_capacity(staged.len());
        let mut usernames: Vec<&str> = Vec::with_capacity(staged.len());

        for user in &staged {
            let key = user.email_key();
            let email_taken = state.by_email.contains_key(&key) || emails.contains(&key);
            if email_taken && !conflicts.contains("email") {
                conflicts.add("email", "has already been taken");
            }
            let username_taken = state.by_username.contains_key(&user.username)
                || usernames.contains(&user.username.as_str());
            if username_taken && !conflicts.contains("username") {
                conflicts.add("username", "has already been taken");
            }
            emails.push(key);
            usernames.push(&user.username);
        }

        if !conflicts.is_empty() {
            tracing::debug!("Memory commit rejected: {}", conflicts);
            return Err(AppError::Conflict(conflicts));
        }

        for (user, key) in staged.iter().zip(emails) {
            state.by_email.insert(key, user.id);
            state.by_username.insert(user.username.clone(), user.id);
            state.users.insert(user.id, user.clone());
        }

        Ok(())
    }

    async fn discard(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
