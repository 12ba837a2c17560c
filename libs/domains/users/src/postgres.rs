use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseConnection, DbBackend, DbErr, FromQueryResult, SqlErr, Statement, TransactionTrait,
};
use serde_json::Value;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, User};
use crate::repository::UserRepository;

const USER_COLUMNS: &str = "id, name, age, md, email, created_date, modify_date";

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: i32,
    name: String,
    age: i32,
    md: Value,
    email: String,
    created_date: DateTime<Utc>,
    modify_date: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            age: row.age,
            md: row.md,
            email: row.email,
            created_date: row.created_date,
            modify_date: row.modify_date,
        }
    }
}

fn db_error(e: DbErr) -> UserError {
    UserError::Database(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, input: CreateUser) -> UserResult<User> {
        let sql = format!(
            "INSERT INTO users (name, age, md, email) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                input.name.into(),
                input.age.into(),
                Value::Object(input.md).into(),
                input.email.clone().into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    UserError::Conflict(input.email.clone())
                }
                _ => db_error(e),
            })?
            .ok_or_else(|| UserError::Internal("INSERT returned no row".to_string()))?;

        tracing::info!(user_id = row.id, "Created user");
        Ok(row.into())
    }

    /// Runs inside its own read transaction, committed on success and rolled
    /// back when dropped on any error path.
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>> {
        let txn = self.db.begin().await.map_err(db_error)?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"),
            [id.into()],
        );
        let row = UserRow::find_by_statement(stmt)
            .one(&txn)
            .await
            .map_err(db_error)?;

        txn.commit().await.map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"),
            [email.into()],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    async fn update(&self, input: UpdateUser) -> UserResult<Option<User>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                "UPDATE users SET name = $1, age = $2, md = $3, modify_date = now() \
                 WHERE id = $4 AND email = $5 RETURNING {USER_COLUMNS}"
            ),
            [
                input.name.into(),
                input.age.into(),
                Value::Object(input.md).into(),
                input.id.into(),
                input.email.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::MockDatabase;
    use serde_json::{Map, json};
    use std::collections::BTreeMap;

    fn row(id: i32, email: &str) -> BTreeMap<&'static str, sea_orm::Value> {
        let now = Utc::now();
        BTreeMap::from([
            ("id", id.into()),
            ("name", "Ada".into()),
            ("age", 36i32.into()),
            ("md", json!({"k": "v"}).into()),
            ("email", email.into()),
            ("created_date", now.into()),
            ("modify_date", now.into()),
        ])
    }

    #[tokio::test]
    async fn test_get_by_id_maps_row_inside_transaction() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![row(1, "ada@example.com")]])
            .into_connection();
        let repo = PostgresUserRepository::new(db);

        let user = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.md, json!({"k": "v"}));
    }

    #[tokio::test]
    async fn test_get_by_id_missing_user() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
            .into_connection();
        let repo = PostgresUserRepository::new(db);

        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_surfaces_database_errors() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let repo = PostgresUserRepository::new(db);

        let err = repo.get_by_id(1).await.unwrap_err();
        assert!(matches!(err, UserError::Database(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn test_update_returns_none_without_match() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, sea_orm::Value>>::new()])
            .into_connection();
        let repo = PostgresUserRepository::new(db);

        let result = repo
            .update(UpdateUser {
                id: 1,
                name: "Ada".to_string(),
                age: 37,
                md: Map::new(),
                email: "nobody@example.com".to_string(),
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
