//! Current user service
//!
//! Get the current user from the request based on the Authorization header, or the default user
//! when test mode is enabled

use std::ops::Deref;
use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::extract::OptionalFromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Error;
use crate::database::Database;
use crate::users::DEFAULT_USER_ID;
use crate::users::User;

/// How long a token is valid, in seconds
const TOKEN_EXPIRES_IN: i64 = 3600;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// How requests without a token are treated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignInMode {
    /// A valid token is required
    Token,

    /// Requests without a token act as the default user
    TestUser,
}

/// The JWT claims to identifies a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: String,

    /// In how many seconds does the token expire
    exp: i64,

    /// A sessions ID, used to expire/invalidate tokens before the expiration date
    jti: Uuid,
}

/// Token information served to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)] // `type` is a reserved keyword
    token_type: String,

    /// In how many seconds does the token expire
    expires_in: i64,

    /// The access token to provide to follow up requests in the Authorization header
    #[allow(clippy::struct_field_names)] // `access_token` is the name of the field
    access_token: String,
}

impl Token {
    /// Create a new token response
    fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            expires_in,
            access_token,
        }
    }
}

/// Current user service
#[derive(Clone)]
pub struct CurrentUser {
    /// The actual user
    user: Arc<User>,
}

impl CurrentUser {
    /// Create the current user from a user
    fn new(user: User) -> Self {
        Self {
            user: Arc::new(user),
        }
    }
}

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// Generate a token for the outside world for a given user
pub fn generate_token(jwt_keys: &JwtKeys, user: &User) -> Result<Token, Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let claims = Claims {
        sub: user.id.clone(),
        exp: chrono::Utc::now().timestamp() + TOKEN_EXPIRES_IN,
        jti: user.session_id,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(Token::new(access_token, TOKEN_EXPIRES_IN))
}

/// Resolve the user of a request
///
/// No Authorization header means no user, unless test mode is enabled. A header that does not
/// resolve to a user is always an error.
async fn resolve_current_user(parts: &mut Parts) -> Result<Option<CurrentUser>, Error> {
    let Extension(database) = parts
        .extract::<Extension<Database>>()
        .await
        .map_err(|_| Error::internal_server_error("Could not get a database pool"))?;

    if !parts.headers.contains_key(AUTHORIZATION) {
        let Extension(sign_in_mode) = parts
            .extract::<Extension<SignInMode>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get the sign in mode"))?;

        if sign_in_mode == SignInMode::TestUser {
            let user = database
                .find_single_user_by_id(DEFAULT_USER_ID)
                .await
                .map_err(Error::internal_server_error)?
                .ok_or_else(|| Error::internal_server_error("Default user is missing"))?;

            return Ok(Some(CurrentUser::new(user)));
        }

        return Ok(None);
    }

    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| Error::unauthorized("Invalid API token"))?;

    let Extension(jwt_keys) = parts
        .extract::<Extension<JwtKeys>>()
        .await
        .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

    let claims = decode_claims(&jwt_keys, bearer.token())?;

    let user = database
        .find_single_user_by_id(&claims.sub)
        .await
        .map_err(Error::internal_server_error)?
        .ok_or_else(|| Error::unauthorized("Could not find user"))?;

    // mechanism to invalidate JWT tokens
    if claims.jti != user.session_id {
        return Err(Error::unauthorized("Token expired"));
    }

    Ok(Some(CurrentUser::new(user)))
}

/// Decode and validate the claims of a token
fn decode_claims(jwt_keys: &JwtKeys, token: &str) -> Result<Claims, Error> {
    use jsonwebtoken::Validation;
    use jsonwebtoken::decode;

    let token_data = decode::<Claims>(token, &jwt_keys.decoding, &Validation::default())
        .map_err(|err| Error::unauthorized("Invalid token").with_description(err))?;

    if token_data.claims.sub.is_empty() {
        return Err(Error::unauthorized("Invalid token"));
    }

    Ok(token_data.claims)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve_current_user(parts)
            .await?
            .ok_or_else(|| Error::unauthorized("Missing API token"))
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        resolve_current_user(parts).await
    }
}
