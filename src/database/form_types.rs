//! Form types

use uuid::Uuid;

use crate::users::User;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The ID of the user, opaque to the rest of the system
    pub id: &'a str,

    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The email address to sign in with
    pub email: &'a str,

    /// Display name
    pub name: Option<&'a str>,

    /// Avatar URL
    pub image: Option<&'a str>,

    /// The hashed password, users without one can not sign in with credentials
    pub hashed_password: Option<&'a str>,
}

/// Values to change a password of a user
pub struct ChangePasswordValues<'a> {
    /// New session ID to invalidate current tokens
    pub session_id: &'a Uuid,

    /// The new hashed password
    pub hashed_password: &'a str,
}

/// Values to create a Document
pub struct CreateDocumentValues<'a> {
    /// The user owning the document
    pub user: &'a User,

    /// Title of the document
    pub title: &'a str,

    /// Optional parent, not validated
    pub parent_id: Option<&'a Uuid>,
}

/// Values to update a Document
///
/// `None` leaves a field untouched, for nullable fields `Some(None)` clears it
#[derive(Default)]
pub struct UpdateDocumentValues<'a> {
    /// New title, an empty string is stored as is
    pub title: Option<&'a str>,

    /// New content
    pub content: Option<Option<&'a str>>,

    /// New cover image URL
    pub cover_image: Option<Option<&'a str>>,

    /// New icon
    pub icon: Option<Option<&'a str>>,

    /// New archive flag, does not cascade to children
    pub is_archived: Option<bool>,

    /// New publish flag
    pub is_published: Option<bool>,

    /// New parent
    pub parent_id: Option<Option<Uuid>>,
}
