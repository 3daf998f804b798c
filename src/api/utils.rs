//! Utility functions for the API

use uuid::Uuid;

use crate::api::Error;
use crate::database::Database;
use crate::documents::Document;
use crate::users::User;

/// Fetch a document owned by the user from the database
///
/// Documents of other users are reported as not found, same as missing ones
pub async fn fetch_owned_document(
    database: &Database,
    user: &User,
    document_id: &Uuid,
) -> Result<Document, Error> {
    database
        .find_single_document_by_owner(user, document_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Document not found")), Ok)
}

/// Parse an optional document ID from a query string value
///
/// An empty value counts as no ID
pub fn parse_optional_document_id(value: Option<&str>) -> Result<Option<Uuid>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|err| Error::bad_request("Invalid query parameter").with_description(err)),
    }
}
