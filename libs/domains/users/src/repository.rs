use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, User};

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; the store assigns `id` and both timestamps
    async fn create(&self, input: CreateUser) -> UserResult<User>;

    /// Single-row lookup by primary key
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Replace name, age and md of the row matching both `id` and `email`.
    ///
    /// Returns `None` when no row matches.
    async fn update(&self, input: UpdateUser) -> UserResult<Option<User>>;
}

/// In-memory implementation of UserRepository (for development/testing)
///
/// Every call opens and closes a counted "session" so tests can check that
/// no lookup leaves one open.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<i32, User>>>,
    sessions: Arc<SessionCounter>,
}

#[derive(Debug, Default)]
struct SessionCounter {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

struct SessionGuard<'a>(&'a SessionCounter);

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// (opened, closed) session counts
    pub fn session_counts(&self) -> (usize, usize) {
        (
            self.sessions.opened.load(Ordering::SeqCst),
            self.sessions.closed.load(Ordering::SeqCst),
        )
    }

    fn open_session(&self) -> SessionGuard<'_> {
        self.sessions.opened.fetch_add(1, Ordering::SeqCst);
        SessionGuard(&self.sessions)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: CreateUser) -> UserResult<User> {
        let _session = self.open_session();
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == input.email) {
            return Err(UserError::Conflict(input.email));
        }

        let id = users.keys().next_back().map_or(1, |last| last + 1);
        let now = Utc::now();
        let user = User {
            id,
            name: input.name,
            age: input.age,
            md: Value::Object(input.md),
            email: input.email,
            created_date: now,
            modify_date: now,
        };
        users.insert(id, user.clone());

        tracing::info!(user_id = id, email = %user.email, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>> {
        let _session = self.open_session();
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let _session = self.open_session();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, input: UpdateUser) -> UserResult<Option<User>> {
        let _session = self.open_session();
        let mut users = self.users.write().await;

        let Some(user) = users
            .get_mut(&input.id)
            .filter(|u| u.email == input.email)
        else {
            return Ok(None);
        };

        user.name = input.name;
        user.age = input.age;
        user.md = Value::Object(input.md);
        user.modify_date = Utc::now();

        tracing::info!(user_id = user.id, "Updated user");
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Test User".to_string(),
            age: 30,
            md: Map::new(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(new_user("a@example.com")).await.unwrap();
        let second = repo.create(new_user("b@example.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_date, first.modify_date);
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(new_user("test@example.com")).await.unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&created));

        let by_email = repo.get_by_email("test@example.com").await.unwrap();
        assert_eq!(by_email, Some(created));

        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("test@example.com")).await.unwrap();

        let result = repo.create(new_user("test@example.com")).await;
        assert!(matches!(result, Err(UserError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_requires_matching_id_and_email() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(new_user("test@example.com")).await.unwrap();

        let mut md = Map::new();
        md.insert("plan".to_string(), Value::from("pro"));
        let update = UpdateUser {
            id: created.id,
            name: "Renamed".to_string(),
            age: 31,
            md,
            email: "other@example.com".to_string(),
        };
        assert!(repo.update(update.clone()).await.unwrap().is_none());

        let updated = repo
            .update(UpdateUser {
                email: "test@example.com".to_string(),
                ..update
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.md["plan"], "pro");
        assert_eq!(updated.email, "test@example.com");
        assert!(updated.modify_date >= created.modify_date);
    }

    #[tokio::test]
    async fn test_every_call_closes_its_session() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("test@example.com")).await.unwrap();
        let _ = repo.create(new_user("test@example.com")).await;
        repo.get_by_id(1).await.unwrap();
        repo.get_by_id(42).await.unwrap();

        assert_eq!(repo.session_counts(), (4, 4));
    }
}
