use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{ErrorResponse, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::dispatch::JobDispatcher;
use crate::error::{UserError, UserResult};
use crate::job::UserLookupJob;
use crate::models::{
    CreateUser, DispatchQuery, EmailQuery, MessageResponse, UpdateUser, UserResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

const TAG: &str = "users";

#[derive(OpenApi)]
#[openapi(
    paths(create_user, get_user, update_user, send_to_queue),
    components(schemas(
        CreateUser,
        UpdateUser,
        UserResponse,
        MessageResponse,
        ErrorResponse
    )),
    tags((name = "users", description = "User records and asynchronous lookups"))
)]
pub struct UsersApiDoc;

pub struct UsersState<R: UserRepository> {
    pub service: UserService<R>,
    pub dispatcher: Arc<dyn JobDispatcher>,
}

/// User CRUD plus the lookup dispatch endpoint
pub fn router<R: UserRepository + 'static>(
    service: UserService<R>,
    dispatcher: Arc<dyn JobDispatcher>,
) -> Router {
    let state = Arc::new(UsersState {
        service,
        dispatcher,
    });

    Router::new()
        .route("/users/create", post(create_user))
        .route("/users", get(get_user))
        .route("/users/update", put(update_user))
        .route("/send_to_queue", post(send_to_queue))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/users/create",
    tag = TAG,
    request_body = CreateUser,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid body or email already exists", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<Json<UserResponse>> {
    let user = state.service.create_user(input).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = TAG,
    params(EmailQuery),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Email missing", body = ErrorResponse),
        (status = 404, description = "No user with that email", body = ErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    Query(query): Query<EmailQuery>,
) -> UserResult<Json<UserResponse>> {
    let user = state.service.get_user_by_email(&query.email).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/users/update",
    tag = TAG,
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "id or email missing", body = ErrorResponse),
        (status = 404, description = "No user matches id and email", body = ErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<UserResponse>> {
    let user = state.service.update_user(input).await?;
    Ok(Json(user))
}

/// Queue a lookup of user `id`; the result is POSTed to `callback_url` later.
///
/// The caller never learns the outcome from this response.
#[utoipa::path(
    post,
    path = "/send_to_queue",
    tag = TAG,
    params(DispatchQuery),
    responses(
        (status = 202, description = "Job queued", body = MessageResponse),
        (status = 400, description = "Missing id or invalid callback_url", body = ErrorResponse),
        (status = 500, description = "Queue publish failed", body = ErrorResponse)
    )
)]
async fn send_to_queue<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    Query(query): Query<DispatchQuery>,
) -> UserResult<impl IntoResponse> {
    if query.id == 0 {
        return Err(UserError::Validation("ID field is required".to_string()));
    }
    validate_callback_url(&query.callback_url)?;

    let job = UserLookupJob::new(query.id, query.callback_url);
    state.dispatcher.dispatch(&job).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("User data has been sent to the queue")),
    ))
}

fn validate_callback_url(raw: &str) -> UserResult<()> {
    let url = reqwest::Url::parse(raw)
        .map_err(|e| UserError::Validation(format!("Invalid callback_url: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(UserError::Validation(
            "callback_url must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(())
}
