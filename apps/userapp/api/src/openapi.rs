use domain_users::handlers::UsersApiDoc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(crate::api::callback::receive_callback),
    info(title = "userapp API", description = "User records and asynchronous lookups"),
    tags((name = "callback", description = "Demo callback receiver"))
)]
struct CallbackDoc;

/// The users document merged with the callback receiver
pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = CallbackDoc::openapi();
    doc.merge(UsersApiDoc::openapi());
    doc
}
