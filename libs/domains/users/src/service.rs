use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, UserResponse};
use crate::repository::UserRepository;

/// Service layer for User business logic
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_arc(Arc::new(repository))
    }

    /// Share a repository with other components (e.g. the readiness probe)
    pub fn from_arc(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Create a user; an existing email is a 400, not a conflict
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        if input.email.is_empty() {
            return Err(UserError::Validation("Email field is required".to_string()));
        }

        if self.repository.get_by_email(&input.email).await?.is_some() {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let created = self.repository.create(input).await?;
        Ok(created.into())
    }

    pub async fn get_user_by_email(&self, email: &str) -> UserResult<UserResponse> {
        if email.is_empty() {
            return Err(UserError::Validation("Email field is required".to_string()));
        }

        let user = self
            .repository
            .get_by_email(email)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(user.into())
    }

    /// Update name, age and md of the user matching both `id` and `email`
    pub async fn update_user(&self, input: UpdateUser) -> UserResult<UserResponse> {
        if input.id == 0 || input.email.is_empty() {
            return Err(UserError::Validation(
                "Both id and email fields are required".to_string(),
            ));
        }

        let updated = self
            .repository
            .update(input)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repository::MockUserRepository;
    use chrono::Utc;
    use mockall::predicate::function;
    use serde_json::{Map, json};

    fn stored(id: i32, email: &str) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Ada".to_string(),
            age: 36,
            md: json!({}),
            email: email.to_string(),
            created_date: now,
            modify_date: now,
        }
    }

    fn create_input(email: &str) -> CreateUser {
        CreateUser {
            name: "Ada".to_string(),
            age: 36,
            md: Map::new(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_existing_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_get_by_email()
            .with(function(|email: &str| email == "ada@example.com"))
            .returning(|email| Ok(Some(stored(1, email))));
        mock_repo.expect_create().never();

        let service = UserService::new(mock_repo);
        let err = service
            .create_user(create_input("ada@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(email) if email == "ada@example.com"));
    }

    #[tokio::test]
    async fn test_create_user_inserts_new_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_get_by_email().returning(|_| Ok(None));
        mock_repo
            .expect_create()
            .times(1)
            .returning(|input| Ok(stored(5, &input.email)));

        let service = UserService::new(mock_repo);
        let created = service
            .create_user(create_input("new@example.com"))
            .await
            .unwrap();

        assert_eq!(created.id, 5);
        assert_eq!(created.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_get_user_by_email_requires_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_get_by_email().never();

        let service = UserService::new(mock_repo);
        let err = service.get_user_by_email("").await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_user_by_email_not_found() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_get_by_email().returning(|_| Ok(None));

        let service = UserService::new(mock_repo);
        let err = service.get_user_by_email("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }

    #[tokio::test]
    async fn test_update_user_requires_id_and_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_update().never();
        let service = UserService::new(mock_repo);

        let missing_id = UpdateUser {
            id: 0,
            name: "Ada".to_string(),
            age: 36,
            md: Map::new(),
            email: "ada@example.com".to_string(),
        };
        let missing_email = UpdateUser {
            id: 1,
            email: String::new(),
            ..missing_id.clone()
        };

        for input in [missing_id, missing_email] {
            let err = service.update_user(input).await.unwrap_err();
            assert!(matches!(err, UserError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_update_user_not_found_when_no_row_matches() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_update().returning(|_| Ok(None));

        let service = UserService::new(mock_repo);
        let err = service
            .update_user(UpdateUser {
                id: 1,
                name: "Ada".to_string(),
                age: 36,
                md: Map::new(),
                email: "ada@example.com".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }
}
