use anyhow::Result;
use chrono::naive::NaiveDateTime;
use uuid::Uuid;

use crate::database::CreateUserValues;
use crate::database::Database;
use crate::password::generate;
use crate::password::hash;
use crate::utils::env_var_or_else;

/// ID of the user used in test mode
pub const DEFAULT_USER_ID: &str = "default-user-id";

/// Name of the user used in test mode
pub const DEFAULT_USER_NAME: &str = "Test User";

/// Email of the user used in test mode
pub const DEFAULT_USER_EMAIL: &str = "test@example.com";

/// Avatar of the user used in test mode
pub const DEFAULT_USER_IMAGE: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=32&h=32&fit=crop&crop=face";

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub session_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub hashed_password: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Make sure there is at least one user to sign in with
pub async fn ensure_initial_user(database: &Database) -> Result<()> {
    let user = database.find_any_single_user().await?;

    if user.is_none() {
        let email = env_var_or_else("INITIAL_EMAIL", || {
            let initial_email = format!("{}@jotion.local", Uuid::new_v4());
            tracing::info!("`INITIAL_EMAIL` not set, generating new email: {initial_email}");
            initial_email
        });

        let password = env_var_or_else("INITIAL_PASSWORD", || {
            let initial_password = generate();
            tracing::info!(
                "`INITIAL_PASSWORD` not set, generating new password: {initial_password}"
            );
            initial_password
        });

        let hashed_password = hash(&password)?;

        let id = Uuid::new_v4().to_string();
        let values = CreateUserValues {
            id: &id,
            session_id: &Uuid::new_v4(),
            email: &email,
            name: None,
            image: None,
            hashed_password: Some(&hashed_password),
        };

        database.create_user(&values).await?;
    }

    Ok(())
}

/// Make sure the test mode user exists
///
/// The user has no password, it can only be used via test mode
pub async fn ensure_default_user(database: &Database) -> Result<User> {
    if let Some(user) = database.find_single_user_by_id(DEFAULT_USER_ID).await? {
        return Ok(user);
    }

    tracing::info!("Test mode enabled, creating default user `{DEFAULT_USER_ID}`");

    let values = CreateUserValues {
        id: DEFAULT_USER_ID,
        session_id: &Uuid::new_v4(),
        email: DEFAULT_USER_EMAIL,
        name: Some(DEFAULT_USER_NAME),
        image: Some(DEFAULT_USER_IMAGE),
        hashed_password: None,
    };

    Ok(database.create_user(&values).await?)
}
