//! All API endpoint setup

use axum::Router;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;

pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use current_user::SignInMode;
pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use request::nullable;
pub use request::parse_url;
pub use response::Error;
pub use response::Success;
pub use response::not_found;

mod current_user;
mod documents;
mod request;
mod response;
mod users;
mod utils;

/// Get the Axum router for all API routes
///
/// Known routes called with an unsupported method respond with a JSON 405
pub fn router() -> Router {
    use response::method_not_allowed;

    let users = Router::new()
        .route("/", post(users::create).fallback(method_not_allowed))
        .route("/token", post(users::token).fallback(method_not_allowed))
        .route("/me", get(users::me).fallback(method_not_allowed))
        .route(
            "/me/password",
            put(users::change_password).fallback(method_not_allowed),
        );

    let documents = Router::new()
        .route(
            "/",
            get(documents::list)
                .post(documents::create)
                .fallback(method_not_allowed),
        )
        .route(
            "/search",
            get(documents::search).fallback(method_not_allowed),
        )
        .route("/trash", get(documents::trash).fallback(method_not_allowed))
        .route(
            "/sidebar",
            get(documents::sidebar).fallback(method_not_allowed),
        )
        .route(
            "/{document}",
            get(documents::single)
                .patch(documents::update)
                .delete(documents::delete)
                .fallback(method_not_allowed),
        )
        .route(
            "/{document}/archive",
            patch(documents::archive).fallback(method_not_allowed),
        )
        .route(
            "/{document}/restore",
            patch(documents::restore).fallback(method_not_allowed),
        );

    Router::new()
        .nest("/users", users)
        .nest("/documents", documents)
}
