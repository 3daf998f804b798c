use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;
use crate::users::DEFAULT_USER_EMAIL;
use crate::users::DEFAULT_USER_ID;

#[sqlx::test]
async fn test_requests_without_token_use_default_user(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app_with_test_user(pool).await;

    let (status_code, user) = helper::current_user(&mut app, None).await;
    assert_eq!(StatusCode::OK, status_code);
    let user = user.unwrap();
    assert_eq!(DEFAULT_USER_ID, user.id);
    assert_eq!(DEFAULT_USER_EMAIL, user.email);
    assert_eq!(Some("Test User".to_string()), user.name);

    let (status_code, document, _) =
        helper::maybe_create_document(&mut app, None, &json!({ "title": "Notes" })).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let document = document.unwrap();
    assert_eq!(DEFAULT_USER_ID, document.user_id);

    let (status_code, stored) = helper::single_document(&mut app, None, &document.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(document), stored);
}

#[sqlx::test]
async fn test_tokens_still_work_in_test_mode(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app_with_test_user(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    let (_, user) = helper::current_user(&mut app, Some(&access_token)).await;
    assert_eq!("someone@example.com", user.unwrap().email);

    // invalid tokens are not replaced by the default user
    let (status_code, _) = helper::current_user(&mut app, Some("Bearer not-a-token")).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status_code);
}
