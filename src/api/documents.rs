//! Documents API endpoints
//!
//! Everything related to the document tree of the current user

use std::future::Future;

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::database;
use crate::database::CreateDocumentValues;
use crate::database::Database;
use crate::database::UpdateDocumentValues;
use crate::documents::Document;
use crate::documents::title_or_default;
use crate::files::FileStore;
use crate::navigation::ChildLoader;
use crate::navigation::ExpandedState;
use crate::navigation::SidebarItem;
use crate::navigation::build_sidebar;
use crate::users::User;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::QueryParameters;
use super::Success;
use super::nullable;
use super::parse_url;
use super::utils::fetch_owned_document;
use super::utils::parse_optional_document_id;

/// Document response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    /// Document ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Owner of the document
    pub user_id: String,

    /// Parent document, `null` for top-level documents
    pub parent_id: Option<Uuid>,

    /// Serialized rich-text blocks
    pub content: Option<String>,

    /// URL of the cover image
    pub cover_image: Option<String>,

    /// Emoji icon
    pub icon: Option<String>,

    /// Is the document in the trash
    pub is_archived: bool,

    /// Is the document readable by everybody
    pub is_published: bool,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

impl DocumentResponse {
    /// Create a response from a [`Document`](Document)
    fn from_document(document: Document) -> Self {
        Self {
            id: document.id,
            title: document.title,
            user_id: document.user_id,
            parent_id: document.parent_id,
            content: document.content,
            cover_image: document.cover_image,
            icon: document.icon,
            is_archived: document.is_archived,
            is_published: document.is_published,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }

    /// Create a response from multiple [`Document`](Document)s
    fn from_document_multiple(documents: Vec<Document>) -> Vec<Self> {
        documents.into_iter().map(Self::from_document).collect()
    }
}

/// A single row of the sidebar
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarItemResponse {
    /// Document ID
    pub id: Uuid,

    /// Parent document
    pub parent_id: Option<Uuid>,

    /// Title
    pub title: String,

    /// Emoji icon
    pub icon: Option<String>,

    /// Nesting depth
    pub level: usize,

    /// Are the children of this document shown
    pub is_expanded: bool,
}

impl SidebarItemResponse {
    fn from_sidebar_item(item: SidebarItem) -> Self {
        Self {
            id: item.document.id,
            parent_id: item.document.parent_id,
            title: item.document.title,
            icon: item.document.icon,
            level: item.level,
            is_expanded: item.is_expanded,
        }
    }
}

/// Response after deleting a document
#[derive(Debug, Serialize)]
pub struct DeletedDocumentResponse {
    /// ID of the deleted document
    pub id: Uuid,

    /// Human readable confirmation
    pub message: &'static str,
}

/// List documents query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQuery {
    /// Parent to list the children of, absent or empty for the top-level documents
    parent_id: Option<String>,
}

/// List the non-archived documents with a given parent
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/api/documents?parentId=<uuid>'
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "title": "Untitled" ... } ] }
/// ```
pub async fn list(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    QueryParameters(query): QueryParameters<ListDocumentsQuery>,
) -> Result<Success<Vec<DocumentResponse>>, Error> {
    let parent_id = parse_optional_document_id(query.parent_id.as_deref())?;

    let documents = database
        .find_all_documents_by_parent(&current_user, parent_id.as_ref())
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DocumentResponse::from_document_multiple(
        documents,
    )))
}

/// All non-archived documents, most recently updated first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/documents/search
/// ```
pub async fn search(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<Vec<DocumentResponse>>, Error> {
    let documents = database
        .find_all_documents_by_archived(&current_user, false)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DocumentResponse::from_document_multiple(
        documents,
    )))
}

/// All archived documents, most recently updated first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/documents/trash
/// ```
pub async fn trash(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<Vec<DocumentResponse>>, Error> {
    let documents = database
        .find_all_documents_by_archived(&current_user, true)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DocumentResponse::from_document_multiple(
        documents,
    )))
}

/// Sidebar query
#[derive(Debug, Deserialize)]
pub struct SidebarQuery {
    /// Comma separated IDs of the expanded documents
    expanded: Option<String>,
}

/// Loads the non-archived children of the documents of a single user
struct UserDocuments<'a> {
    database: &'a Database,
    user: &'a User,
}

impl ChildLoader for UserDocuments<'_> {
    type Error = database::Error;

    fn load_children(
        &self,
        parent_id: Option<&Uuid>,
    ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send {
        let parent_id = parent_id.copied();

        async move {
            self.database
                .find_all_documents_by_parent(self.user, parent_id.as_ref())
                .await
        }
    }
}

/// The document tree as shown in the sidebar
///
/// Only the children of the expanded documents are included
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/api/documents/sidebar?expanded=<uuid>,<uuid>'
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "title": "Untitled", "level": 0, "isExpanded": true ... } ] }
/// ```
pub async fn sidebar(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    QueryParameters(query): QueryParameters<SidebarQuery>,
) -> Result<Success<Vec<SidebarItemResponse>>, Error> {
    let state = ExpandedState::parse(query.expanded.as_deref().unwrap_or_default())
        .map_err(|err| Error::bad_request("Invalid query parameter").with_description(err))?;

    let loader = UserDocuments {
        database: &database,
        user: &current_user,
    };

    let items = build_sidebar(&loader, &state)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(
        items
            .into_iter()
            .map(SidebarItemResponse::from_sidebar_item)
            .collect(),
    ))
}

/// Get a single document
///
/// Owners can read all their documents, published documents that are not archived can be read by
/// anybody, signed in or not
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/documents/<uuid>
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "title": "Untitled" ... } }
/// ```
pub async fn single(
    Extension(database): Extension<Database>,
    current_user: Option<CurrentUser>,
    PathParameters(document_id): PathParameters<Uuid>,
) -> Result<Success<DocumentResponse>, Error> {
    let document = database
        .find_single_document_by_id(&document_id)
        .await
        .map_err(Error::internal_server_error)?
        .filter(|document| {
            document.is_readable_by(current_user.as_ref().map(|user| user.id.as_str()))
        })
        .ok_or_else(|| Error::not_found("Document not found"))?;

    Ok(Success::ok(DocumentResponse::from_document(document)))
}

/// Create document form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentForm {
    /// Title, "Untitled" when missing or empty
    title: Option<String>,

    /// Optional parent document
    parent_id: Option<Uuid>,
}

/// Create a document based on the [`CreateDocumentForm`](CreateDocumentForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Untitled", "parentId": "<uuid>" }' \
///     http://localhost:6000/api/documents
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "title": "Untitled" ... } }
/// ```
pub async fn create(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreateDocumentForm>,
) -> Result<Success<DocumentResponse>, Error> {
    let values = CreateDocumentValues {
        user: &current_user,
        title: title_or_default(form.title.as_deref()),
        parent_id: form.parent_id.as_ref(),
    };

    let document = database
        .create_document(&values)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::debug!("Created document {} for {}", document.id, current_user.id);

    Ok(Success::created(DocumentResponse::from_document(document)))
}

/// Update document form
///
/// Fields to update a document with, all fields are optional and are not touched when not
/// provided. The nullable fields are cleared with an explicit `null`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentForm {
    /// New title, stored as is
    title: Option<String>,

    /// New serialized content
    #[serde(default, deserialize_with = "nullable")]
    content: Option<Option<String>>,

    /// New cover image URL
    #[serde(default, deserialize_with = "nullable")]
    cover_image: Option<Option<String>>,

    /// New icon
    #[serde(default, deserialize_with = "nullable")]
    icon: Option<Option<String>>,

    /// Move in or out of the trash, without touching the children
    is_archived: Option<bool>,

    /// Publish or unpublish
    is_published: Option<bool>,

    /// Move the document
    #[serde(default, deserialize_with = "nullable")]
    parent_id: Option<Option<Uuid>>,
}

/// Update a document based on the [`UpdateDocumentForm`](UpdateDocumentForm) form
///
/// Only provided values are processed, the other fields of the document will not be touched
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Roadmap", "icon": "🚀", "coverImage": null }' \
///     http://localhost:6000/api/documents/<uuid>
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "title": "Roadmap" ... } }
/// ```
pub async fn update(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(document_id): PathParameters<Uuid>,
    Form(form): Form<UpdateDocumentForm>,
) -> Result<Success<DocumentResponse>, Error> {
    let document = fetch_owned_document(&database, &current_user, &document_id).await?;

    if let Some(Some(ref cover_image)) = form.cover_image {
        parse_url(cover_image)?;
    }

    let values = UpdateDocumentValues {
        title: form.title.as_deref(),
        content: form.content.as_ref().map(Option::as_deref),
        cover_image: form.cover_image.as_ref().map(Option::as_deref),
        icon: form.icon.as_ref().map(Option::as_deref),
        is_archived: form.is_archived,
        is_published: form.is_published,
        parent_id: form.parent_id,
    };

    let updated_document = database
        .update_document(&document, &values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DocumentResponse::from_document(
        updated_document,
    )))
}

/// Permanently delete a document
///
/// The cover image is removed from the file store first, failing to do so does not stop the
/// deletion. Children of the document are left in place.
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/documents/<uuid>
/// ```
pub async fn delete(
    Extension(database): Extension<Database>,
    Extension(file_store): Extension<FileStore>,
    current_user: CurrentUser,
    PathParameters(document_id): PathParameters<Uuid>,
) -> Result<Success<DeletedDocumentResponse>, Error> {
    let document = fetch_owned_document(&database, &current_user, &document_id).await?;

    if let Some(ref cover_image) = document.cover_image {
        file_store.delete(cover_image).await;
    }

    database
        .delete_document(&document)
        .await
        .map_err(Error::internal_server_error)?;

    tracing::debug!("Deleted document {}", document.id);

    Ok(Success::ok(DeletedDocumentResponse {
        id: document.id,
        message: "Document deleted",
    }))
}

/// Move a document and all its descendants to the trash
///
/// Request:
/// ```sh
/// curl -v -XPATCH \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/documents/<uuid>/archive
/// ```
pub async fn archive(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(document_id): PathParameters<Uuid>,
) -> Result<Success<DocumentResponse>, Error> {
    let document = fetch_owned_document(&database, &current_user, &document_id).await?;

    let archived_document = database
        .archive_document(&document)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DocumentResponse::from_document(
        archived_document,
    )))
}

/// Restore a document and all its descendants from the trash
///
/// When the parent is still in the trash, the document becomes a top-level document
///
/// Request:
/// ```sh
/// curl -v -XPATCH \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/documents/<uuid>/restore
/// ```
pub async fn restore(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(document_id): PathParameters<Uuid>,
) -> Result<Success<DocumentResponse>, Error> {
    let document = fetch_owned_document(&database, &current_user, &document_id).await?;

    let restored_document = database
        .restore_document(&document)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(DocumentResponse::from_document(
        restored_document,
    )))
}
