use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

#[sqlx::test]
async fn test_update(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    let document = helper::create_document(&mut app, &access_token, "Draft", None).await;

    // only the given fields change
    let updated = helper::update_document(
        &mut app,
        &access_token,
        &document.id,
        &json!({
            "icon": "🚀",
            "content": "[{\"type\":\"paragraph\"}]",
            "coverImage": "https://files.example.com/cover.png",
        }),
    )
    .await;
    assert_eq!("Draft", updated.title);
    assert_eq!(Some("🚀".to_string()), updated.icon);
    assert_eq!(
        Some("[{\"type\":\"paragraph\"}]".to_string()),
        updated.content
    );
    assert_eq!(
        Some("https://files.example.com/cover.png".to_string()),
        updated.cover_image
    );

    // a second update keeps the first one
    let updated = helper::update_document(
        &mut app,
        &access_token,
        &document.id,
        &json!({ "title": "Roadmap", "isPublished": true }),
    )
    .await;
    assert_eq!("Roadmap", updated.title);
    assert_eq!(Some("🚀".to_string()), updated.icon);
    assert!(updated.is_published);

    // null clears a field
    let updated = helper::update_document(
        &mut app,
        &access_token,
        &document.id,
        &json!({ "icon": null, "coverImage": null }),
    )
    .await;
    assert_eq!(None, updated.icon);
    assert_eq!(None, updated.cover_image);
    assert!(updated.content.is_some());

    // empty title is stored as is
    let updated =
        helper::update_document(&mut app, &access_token, &document.id, &json!({ "title": "" }))
            .await;
    assert_eq!("", updated.title);

    // unknown and read-only fields are ignored
    let updated = helper::update_document(
        &mut app,
        &access_token,
        &document.id,
        &json!({ "userId": "someone-else", "id": "nope", "color": "red" }),
    )
    .await;
    assert_eq!(document.id, updated.id);
    assert_eq!(document.user_id, updated.user_id);

    // the stored document matches
    let (_, stored) = helper::single_document(&mut app, Some(&access_token), &document.id).await;
    assert_eq!(Some(updated), stored);
}

#[sqlx::test]
async fn test_update_invalid_values(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    let document = helper::create_document(&mut app, &access_token, "Draft", None).await;

    let (status_code, _, error) = helper::maybe_update_document(
        &mut app,
        &access_token,
        &document.id,
        &json!({ "coverImage": "not a url" }),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Invalid URL", error.unwrap().error);

    let (status_code, _, error) = helper::maybe_update_document(
        &mut app,
        &access_token,
        &document.id,
        &json!({ "isPublished": "yes" }),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Data error", error.unwrap().error);
}

#[sqlx::test]
async fn test_move_document(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    let one = helper::create_document(&mut app, &access_token, "One", None).await;
    let two = helper::create_document(&mut app, &access_token, "Two", None).await;

    let moved = helper::update_document(
        &mut app,
        &access_token,
        &two.id,
        &json!({ "parentId": one.id }),
    )
    .await;
    assert_eq!(Some(one.id), moved.parent_id);

    let top_level = helper::list_documents(&mut app, &access_token, None).await;
    assert!(helper::find(&top_level, &two.id).is_none());

    // back to the top-level
    let moved =
        helper::update_document(&mut app, &access_token, &two.id, &json!({ "parentId": null }))
            .await;
    assert_eq!(None, moved.parent_id);

    let top_level = helper::list_documents(&mut app, &access_token, None).await;
    assert!(helper::find(&top_level, &two.id).is_some());
}

#[sqlx::test]
async fn test_archive_flag_does_not_cascade(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    let parent = helper::create_document(&mut app, &access_token, "Parent", None).await;
    let child = helper::create_document(&mut app, &access_token, "Child", Some(&parent.id)).await;

    let updated = helper::update_document(
        &mut app,
        &access_token,
        &parent.id,
        &json!({ "isArchived": true }),
    )
    .await;
    assert!(updated.is_archived);

    let (_, child) = helper::single_document(&mut app, Some(&access_token), &child.id).await;
    assert!(!child.unwrap().is_archived);
}
