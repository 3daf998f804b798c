//! Documents

use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// Title used when a document is created without one
pub const DEFAULT_TITLE: &str = "Untitled";

/// A node in the document forest of a user
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Document {
    /// Document ID
    pub id: Uuid,

    /// The ID of the user owning the document
    pub user_id: String,

    /// Optional parent document, `None` for top-level documents
    pub parent_id: Option<Uuid>,

    /// Title of the document
    pub title: String,

    /// Serialized rich-text blocks
    pub content: Option<String>,

    /// URL of the cover image
    pub cover_image: Option<String>,

    /// Emoji icon
    pub icon: Option<String>,

    /// Is the document in the trash?
    pub is_archived: bool,

    /// Can the document be read by anyone?
    pub is_published: bool,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,
}

impl Document {
    /// Is the document owned by the given user?
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Can anybody read this document?
    pub fn is_public(&self) -> bool {
        self.is_published && !self.is_archived
    }

    /// Can the (optional) user read this document?
    ///
    /// Owners can always read their documents, everybody else only public ones
    pub fn is_readable_by(&self, user_id: Option<&str>) -> bool {
        user_id.is_some_and(|user_id| self.is_owned_by(user_id)) || self.is_public()
    }
}

/// Normalize the title for a new document
pub fn title_or_default(title: Option<&str>) -> &str {
    match title {
        Some(title) if !title.is_empty() => title,
        _ => DEFAULT_TITLE,
    }
}
