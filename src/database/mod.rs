//! All things related to the storage of users and documents

use core::fmt;
use std::collections::HashSet;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Transaction;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub use Config as DatabaseConfig;
pub use form_types::*;

use crate::documents::Document;
use crate::users::User;

mod form_types;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// The database is not configured correctly
    Configuration(String),

    /// A connection error with the storage
    Connection(String),

    /// A unique constraint did not hold, the row already exists
    UniqueViolation(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Configuration(error) => write!(f, "Configuration error: {error}"),
            Error::Connection(error) => write!(f, "Connection error: {error}"),
            Error::UniqueViolation(error) => write!(f, "Unique violation: {error}"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Database configuration
pub enum Config {
    /// Detect configuration from environment
    DetectConfig,

    /// Use existing connection
    ExistingConnection(PgPool),
}

/// Postgres storage
#[derive(Clone)]
pub struct Database {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Database {
    /// Create a new Postgres storage
    pub async fn from_config(config: Config) -> Result<Self> {
        match config {
            Config::DetectConfig => Self::new().await,
            Config::ExistingConnection(pool) => Self::new_with_pool(pool).await,
        }
    }

    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    async fn new() -> Result<Self> {
        let database_connection_string = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Configuration("`DATABASE_URL` is not set".to_string()))?;

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .map_err(connection_error)?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    async fn new_with_pool(connection_pool: PgPool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(|err| Error::Configuration(format!("Migrations could not run: {err}")))?;

        Ok(Self { connection_pool })
    }
}

impl Database {
    /// Find any single user
    pub async fn find_any_single_user(&self) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r"
            SELECT *
            FROM users
            LIMIT 1
            ",
        )
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Finds a single user by its email address
    pub async fn find_single_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r"
            SELECT *
            FROM users
            WHERE email = $1
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Finds a single user by its ID
    pub async fn find_single_user_by_id(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r"
            SELECT *
            FROM users
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Create a single user
    pub async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (id, session_id, email, name, image, hashed_password)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(values.id)
        .bind(values.session_id)
        .bind(values.email)
        .bind(values.name)
        .bind(values.image)
        .bind(values.hashed_password)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(insert_error)
    }

    /// Change the password of a user
    pub async fn change_password(
        &self,
        user: &User,
        values: &ChangePasswordValues<'_>,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET session_id = $1, hashed_password = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *
            ",
        )
        .bind(values.session_id)
        .bind(values.hashed_password)
        .bind(&user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Find all non-archived documents of a user with the given parent
    ///
    /// No parent means the top-level documents
    pub async fn find_all_documents_by_parent(
        &self,
        user: &User,
        parent_id: Option<&Uuid>,
    ) -> Result<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            r"
            SELECT *
            FROM documents
            WHERE user_id = $1
                AND parent_id IS NOT DISTINCT FROM $2
                AND is_archived = FALSE
            ORDER BY created_at DESC
            ",
        )
        .bind(&user.id)
        .bind(parent_id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Find all documents of a user, flat, most recently updated first
    pub async fn find_all_documents_by_archived(
        &self,
        user: &User,
        is_archived: bool,
    ) -> Result<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            r"
            SELECT *
            FROM documents
            WHERE user_id = $1 AND is_archived = $2
            ORDER BY updated_at DESC
            ",
        )
        .bind(&user.id)
        .bind(is_archived)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Find a single document by ID
    ///
    /// DOES NOT check the owner, handle with care
    pub async fn find_single_document_by_id(&self, id: &Uuid) -> Result<Option<Document>> {
        sqlx::query_as::<_, Document>(
            r"
            SELECT *
            FROM documents
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Find a single document by ID, owned by the user
    pub async fn find_single_document_by_owner(
        &self,
        user: &User,
        id: &Uuid,
    ) -> Result<Option<Document>> {
        sqlx::query_as::<_, Document>(
            r"
            SELECT *
            FROM documents
            WHERE id = $1 AND user_id = $2
            LIMIT 1
            ",
        )
        .bind(id)
        .bind(&user.id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Create a document
    pub async fn create_document(&self, values: &CreateDocumentValues<'_>) -> Result<Document> {
        sqlx::query_as::<_, Document>(
            r"
            INSERT INTO documents (id, user_id, parent_id, title)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(&values.user.id)
        .bind(values.parent_id)
        .bind(values.title)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Update a single document
    ///
    /// Every field is merged on its own, fields not in the values are left alone
    pub async fn update_document(
        &self,
        document: &Document,
        values: &UpdateDocumentValues<'_>,
    ) -> Result<Document> {
        sqlx::query_as::<_, Document>(
            r"
            UPDATE documents
            SET title = COALESCE($2, title),
                content = CASE WHEN $3 THEN $4 ELSE content END,
                cover_image = CASE WHEN $5 THEN $6 ELSE cover_image END,
                icon = CASE WHEN $7 THEN $8 ELSE icon END,
                is_archived = COALESCE($9, is_archived),
                is_published = COALESCE($10, is_published),
                parent_id = CASE WHEN $11 THEN $12 ELSE parent_id END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(document.id)
        .bind(values.title)
        .bind(values.content.is_some())
        .bind(values.content.flatten())
        .bind(values.cover_image.is_some())
        .bind(values.cover_image.flatten())
        .bind(values.icon.is_some())
        .bind(values.icon.flatten())
        .bind(values.is_archived)
        .bind(values.is_published)
        .bind(values.parent_id.is_some())
        .bind(values.parent_id.flatten())
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    /// Permanently delete a document
    ///
    /// Children are left as they are
    pub async fn delete_document(&self, document: &Document) -> Result<()> {
        sqlx::query(
            r"
            DELETE FROM documents
            WHERE id = $1
            ",
        )
        .bind(document.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    /// Archive a document and all its descendants
    pub async fn archive_document(&self, document: &Document) -> Result<Document> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        let count = set_archived_in_subtree(&mut transaction, document, true).await?;
        let archived_document = fetch_document(&mut transaction, &document.id).await?;

        transaction.commit().await.map_err(connection_error)?;

        tracing::debug!("Archived {count} document(s) under {}", document.id);

        Ok(archived_document)
    }

    /// Restore a document and all its descendants
    ///
    /// When the parent of the document is still archived, the document is moved to the top-level
    pub async fn restore_document(&self, document: &Document) -> Result<Document> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        let detached = sqlx::query(
            r"
            UPDATE documents
            SET parent_id = NULL
            WHERE id = $1
                AND EXISTS (
                    SELECT 1
                    FROM documents AS parent
                    WHERE parent.id = documents.parent_id AND parent.is_archived = TRUE
                )
            ",
        )
        .bind(document.id)
        .execute(&mut *transaction)
        .await
        .map_err(connection_error)?
        .rows_affected();

        if detached > 0 {
            tracing::debug!("Detached {} from its archived parent", document.id);
        }

        let count = set_archived_in_subtree(&mut transaction, document, false).await?;
        let restored_document = fetch_document(&mut transaction, &document.id).await?;

        transaction.commit().await.map_err(connection_error)?;

        tracing::debug!("Restored {count} document(s) under {}", document.id);

        Ok(restored_document)
    }
}

/// Walk the subtree of a document and set the archive flag on every node, the root included
///
/// Only descendants owned by the owner of the root are visited, returns the number of touched
/// documents
async fn set_archived_in_subtree(
    transaction: &mut Transaction<'_, Postgres>,
    root: &Document,
    is_archived: bool,
) -> Result<usize> {
    let mut visited = HashSet::new();
    let mut pending = vec![root.id];

    while let Some(id) = pending.pop() {
        // parent links can be patched into a loop
        if !visited.insert(id) {
            continue;
        }

        sqlx::query(
            r"
            UPDATE documents
            SET is_archived = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            ",
        )
        .bind(is_archived)
        .bind(id)
        .execute(&mut **transaction)
        .await
        .map_err(connection_error)?;

        let children = sqlx::query_scalar::<_, Uuid>(
            r"
            SELECT id
            FROM documents
            WHERE parent_id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(&root.user_id)
        .fetch_all(&mut **transaction)
        .await
        .map_err(connection_error)?;

        pending.extend(children);
    }

    Ok(visited.len())
}

/// Fetch a document within a transaction
async fn fetch_document(
    transaction: &mut Transaction<'_, Postgres>,
    id: &Uuid,
) -> Result<Document> {
    sqlx::query_as::<_, Document>(
        r"
        SELECT *
        FROM documents
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_one(&mut **transaction)
    .await
    .map_err(connection_error)
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}

/// Convert `SQLx` insert errors, unique violations are kept apart from connection errors
fn insert_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            Error::UniqueViolation(err.to_string())
        }
        err => connection_error(err),
    }
}
