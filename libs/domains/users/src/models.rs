use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// User entity - matches the `users` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub age: i32,
    /// Free-form metadata object
    pub md: Value,
    pub email: String,
    pub created_date: DateTime<Utc>,
    /// Refreshed on every update
    pub modify_date: DateTime<Utc>,
}

/// User as returned by the API and posted to lookup callbacks.
///
/// Timestamps serialize as ISO-8601 (RFC 3339).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub age: i32,
    #[schema(value_type = Object)]
    pub md: Value,
    pub email: String,
    pub created_date: DateTime<Utc>,
    pub modify_date: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            age: user.age,
            md: user.md,
            email: user.email,
            created_date: user.created_date,
            modify_date: user.modify_date,
        }
    }
}

/// Body of `POST /users/create`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(max = 50))]
    pub name: String,
    pub age: i32,
    #[schema(value_type = Object)]
    pub md: Map<String, Value>,
    #[validate(email, length(max = 50))]
    pub email: String,
}

/// Body of `PUT /users/update`.
///
/// `id` and `email` select the row; `name`, `age` and `md` are replaced.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[serde(default)]
    pub id: i32,
    #[validate(length(max = 50))]
    pub name: String,
    pub age: i32,
    #[schema(value_type = Object)]
    pub md: Map<String, Value>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub email: String,
}

/// `GET /users?email=`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

/// `POST /send_to_queue?id=&callback_url=`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DispatchQuery {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
