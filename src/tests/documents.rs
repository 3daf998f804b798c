use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::tests::helper;

#[sqlx::test]
async fn test_documents(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    // nothing yet
    let top_level = helper::list_documents(&mut app, &access_token, None).await;
    assert!(top_level.is_empty());

    // create without a title
    let (status_code, untitled, _) =
        helper::maybe_create_document(&mut app, Some(&access_token), &json!({})).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let untitled = untitled.unwrap();
    assert_eq!("Untitled", untitled.title);
    assert_eq!(None, untitled.parent_id);
    assert!(!untitled.is_archived);
    assert!(!untitled.is_published);

    // empty title is replaced as well
    let (status_code, empty, _) =
        helper::maybe_create_document(&mut app, Some(&access_token), &json!({ "title": "" })).await;
    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!("Untitled", empty.unwrap().title);

    // create a child
    let roadmap = helper::create_document(&mut app, &access_token, "Roadmap", None).await;
    let q1 = helper::create_document(&mut app, &access_token, "Q1", Some(&roadmap.id)).await;
    assert_eq!(Some(roadmap.id), q1.parent_id);

    // single
    let (status_code, document) =
        helper::single_document(&mut app, Some(&access_token), &q1.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(q1.clone()), document);

    // top-level only has the documents without a parent, newest first
    let top_level = helper::list_documents(&mut app, &access_token, None).await;
    assert_eq!(3, top_level.len());
    assert_eq!(roadmap.id, top_level[0].id);
    assert!(helper::find(&top_level, &q1.id).is_none());

    // children
    let children = helper::list_documents(&mut app, &access_token, Some(&roadmap.id)).await;
    assert_eq!(vec![q1.clone()], children);

    // unknown document
    let (status_code, _) =
        helper::single_document(&mut app, Some(&access_token), &Uuid::new_v4()).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
}

#[sqlx::test]
async fn test_create_with_unknown_parent(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    // the parent is not checked, the document is just not reachable from the top-level
    let parent_id = Uuid::new_v4();
    let orphan = helper::create_document(&mut app, &access_token, "Orphan", Some(&parent_id)).await;
    assert_eq!(Some(parent_id), orphan.parent_id);

    let top_level = helper::list_documents(&mut app, &access_token, None).await;
    assert!(top_level.is_empty());

    let children = helper::list_documents(&mut app, &access_token, Some(&parent_id)).await;
    assert_eq!(vec![orphan], children);
}

#[sqlx::test]
async fn test_search_order(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    let one = helper::create_document(&mut app, &access_token, "One", None).await;
    let two = helper::create_document(&mut app, &access_token, "Two", Some(&one.id)).await;

    // most recently updated first, regardless of nesting
    let documents = helper::search_documents(&mut app, &access_token).await;
    assert_eq!(vec![two.id, one.id], helper::ids(&documents));

    helper::update_document(&mut app, &access_token, &one.id, &json!({ "icon": "📄" })).await;

    let documents = helper::search_documents(&mut app, &access_token).await;
    assert_eq!(vec![one.id, two.id], helper::ids(&documents));

    // archived documents are not searchable
    helper::maybe_archive_document(&mut app, &access_token, &two.id).await;

    let documents = helper::search_documents(&mut app, &access_token).await;
    assert_eq!(vec![one.id], helper::ids(&documents));
}

#[sqlx::test]
async fn test_invalid_parent_query(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let access_token = helper::register_and_login(&mut app, "someone@example.com").await;

    let (status_code, body) = helper::send(
        &mut app,
        axum::http::Method::GET,
        "/api/documents?parentId=not-a-document",
        Some(&access_token),
        None,
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Invalid query parameter", helper::get_error(&body).error);

    // empty parent is the top-level
    let (status_code, _) = helper::send(
        &mut app,
        axum::http::Method::GET,
        "/api/documents?parentId=",
        Some(&access_token),
        None,
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);
}

#[sqlx::test]
async fn test_documents_require_a_token(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let (status_code, _, error) =
        helper::maybe_create_document(&mut app, None, &json!({ "title": "Nope" })).await;
    assert_eq!(StatusCode::UNAUTHORIZED, status_code);
    assert_eq!("Missing API token", error.unwrap().error);

    let (status_code, _, error) = helper::maybe_create_document(
        &mut app,
        Some("Bearer not-a-token"),
        &json!({ "title": "Nope" }),
    )
    .await;
    assert_eq!(StatusCode::UNAUTHORIZED, status_code);
    assert_eq!("Invalid token", error.unwrap().error);
}
