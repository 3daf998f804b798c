use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

#[sqlx::test]
async fn test_private_documents(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let owner = helper::register_and_login(&mut app, "owner@example.com").await;
    let other = helper::register_and_login(&mut app, "other@example.com").await;

    let document = helper::create_document(&mut app, &owner, "Secret", None).await;

    // other users can not tell it exists
    let (status_code, _) = helper::single_document(&mut app, Some(&other), &document.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, _) = helper::single_document(&mut app, None, &document.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, _, error) = helper::maybe_update_document(
        &mut app,
        &other,
        &document.id,
        &json!({ "title": "Mine now" }),
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!("Document not found", error.unwrap().error);

    let (status_code, _) = helper::maybe_archive_document(&mut app, &other, &document.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, _) = helper::maybe_restore_document(&mut app, &other, &document.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, _) = helper::maybe_delete_document(&mut app, &other, &document.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    // lists are per user
    let top_level = helper::list_documents(&mut app, &other, None).await;
    assert!(top_level.is_empty());
    assert!(helper::search_documents(&mut app, &other).await.is_empty());

    // untouched
    let (_, stored) = helper::single_document(&mut app, Some(&owner), &document.id).await;
    assert_eq!(Some(document), stored);
}

#[sqlx::test]
async fn test_published_documents(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let owner = helper::register_and_login(&mut app, "owner@example.com").await;
    let other = helper::register_and_login(&mut app, "other@example.com").await;

    let document = helper::create_document(&mut app, &owner, "Public", None).await;
    helper::update_document(&mut app, &owner, &document.id, &json!({ "isPublished": true })).await;

    // readable by everybody
    let (status_code, published) =
        helper::single_document(&mut app, Some(&other), &document.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert!(published.unwrap().is_published);

    let (status_code, _) = helper::single_document(&mut app, None, &document.id).await;
    assert_eq!(StatusCode::OK, status_code);

    // but only writable by the owner
    let (status_code, _, _) = helper::maybe_update_document(
        &mut app,
        &other,
        &document.id,
        &json!({ "title": "Mine now" }),
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    // archived published documents are hidden again
    helper::maybe_archive_document(&mut app, &owner, &document.id).await;

    let (status_code, _) = helper::single_document(&mut app, Some(&other), &document.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, _) = helper::single_document(&mut app, None, &document.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, _) = helper::single_document(&mut app, Some(&owner), &document.id).await;
    assert_eq!(StatusCode::OK, status_code);
}

#[sqlx::test]
async fn test_invalid_token_on_public_document(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let owner = helper::register_and_login(&mut app, "owner@example.com").await;

    let document = helper::create_document(&mut app, &owner, "Public", None).await;
    helper::update_document(&mut app, &owner, &document.id, &json!({ "isPublished": true })).await;

    let (status_code, _) =
        helper::single_document(&mut app, Some("Bearer not-a-token"), &document.id).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status_code);
}
