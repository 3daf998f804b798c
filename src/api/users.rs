//! User API endpoints
//!
//! Sign up, sign in and the account of the current user

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::database;
use crate::database::ChangePasswordValues;
use crate::database::CreateUserValues;
use crate::database::Database;
use crate::password::hash;
use crate::password::verify;
use crate::users::User;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside world
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// The user ID
    pub id: String,

    /// The email address
    pub email: String,

    /// Display name
    pub name: Option<String>,

    /// Avatar URL
    pub image: Option<String>,

    /// Signed up at
    pub created_at: NaiveDateTime,

    /// Last changed at, a password change counts as well
    pub updated_at: NaiveDateTime,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Email address of the user
    email: String,
    /// Password of the user
    password: String,
}

/// Get a token for a user "session"
///
/// The token can then be used to access the rest of the API routes by using it in the
/// `Authorization` header
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "someone@example.com", "password": "verysecret" }' \
///     http://localhost:6000/api/users/token
/// ```
///
/// Response
/// ```json
/// { "data": { "tokenType": "Bearer", "expiresIn": 3600, "accessToken": "some token" } }
/// ```
pub async fn token(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(database): Extension<Database>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let user = database
        .find_single_user_by_email(&form.email)
        .await
        .map_err(Error::internal_server_error)?;

    match user {
        Some(user) if verify(user.hashed_password.as_deref(), &form.password) => {
            let token = generate_token(&jwt_keys, &user)?;

            Ok(Success::ok(token))
        }
        _ => Err(Error::bad_request("Invalid email or password")),
    }
}

/// Sign up form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    /// Email address to sign in with
    email: String,
    /// Password to sign in with
    password: String,
    /// Optional display name
    name: Option<String>,
    /// Optional avatar URL
    image: Option<String>,
}

/// Create a user based on the [`CreateUserForm`](CreateUserForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "someone@example.com", "password": "verysecret", "name": "Someone" }' \
///     http://localhost:6000/api/users
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "email": "someone@example.com", "name": "Someone" ... } }
/// ```
pub async fn create(
    Extension(database): Extension<Database>,
    Form(form): Form<CreateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    let email = form.email.trim();

    if email.is_empty() || !email.contains('@') {
        return Err(Error::bad_request("Invalid email address"));
    }

    if form.password.is_empty() {
        return Err(Error::bad_request("Password can not be empty"));
    }

    let user = database
        .find_single_user_by_email(email)
        .await
        .map_err(Error::internal_server_error)?;

    if user.is_some() {
        return Err(Error::bad_request("User already exists"));
    }

    let hashed_password = hash(&form.password).map_err(Error::internal_server_error)?;

    let id = Uuid::new_v4().to_string();
    let values = CreateUserValues {
        id: &id,
        session_id: &Uuid::new_v4(),
        email,
        name: form.name.as_deref(),
        image: form.image.as_deref(),
        hashed_password: Some(&hashed_password),
    };

    // a concurrent sign up can still win the race after the lookup above
    let user = database
        .create_user(&values)
        .await
        .map_err(|err| match err {
            database::Error::UniqueViolation(_) => Error::bad_request("User already exists"),
            err => Error::internal_server_error(err),
        })?;

    tracing::info!("Created user {}", user.id);

    Ok(Success::created(UserResponse::from_user(user)))
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "email": "someone@example.com" ... } }
/// ```
pub async fn me(current_user: CurrentUser) -> Success<UserResponse> {
    Success::ok(UserResponse::from_user(User::clone(&current_user)))
}

/// Change password form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    /// Current password for verification
    current_password: String,
    /// New password
    password: String,
}

/// Change the password of the current user
///
/// Changing your password will invalidate all your current access tokens
///
/// Request:
/// ```sh
/// curl -v -XPUT -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "currentPassword": "verysecret", "password": "veryverysecret" }' \
///     http://localhost:6000/api/users/me/password
/// ```
///
/// Response
/// ```json
/// { "data": { "tokenType": "Bearer", "expiresIn": 3600, "accessToken": "some token" } }
/// ```
pub async fn change_password(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Success<Token>, Error> {
    if !verify(
        current_user.hashed_password.as_deref(),
        &form.current_password,
    ) {
        return Err(Error::bad_request("Invalid password"));
    }

    if form.password.is_empty() {
        return Err(Error::bad_request("Password can not be empty"));
    }

    let hashed_password = hash(&form.password).map_err(Error::internal_server_error)?;

    let values = ChangePasswordValues {
        session_id: &Uuid::new_v4(),
        hashed_password: &hashed_password,
    };

    let updated_user = database
        .change_password(&current_user, &values)
        .await
        .map_err(Error::internal_server_error)?;

    let token = generate_token(&jwt_keys, &updated_user)?;

    Ok(Success::ok(token))
}
