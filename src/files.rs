//! External file storage
//!
//! Cover images are uploaded by the client straight to an external object store, the server only
//! ever removes them again

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::utils::env_var;

/// Timeout for a single call to the file store
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Request body to delete a file
#[derive(Debug, Serialize)]
struct DeleteFileRequest<'a> {
    /// Public URL of the stored file
    url: &'a str,
}

/// Client of the external file store
#[derive(Clone, Debug)]
pub enum FileStore {
    /// No file store configured, deletions are skipped
    Disabled,

    /// Remote file store
    Remote {
        /// HTTP client
        client: Client,

        /// Endpoint accepting delete requests
        delete_endpoint: Url,

        /// Optional bearer token for the endpoint
        token: Option<String>,
    },
}

impl FileStore {
    /// Configure the file store from `FILE_STORE_URL` and `FILE_STORE_TOKEN`
    ///
    /// # Errors
    ///
    /// Will return `Err` when the URL is invalid or the HTTP client can not be built
    pub fn from_env() -> anyhow::Result<Self> {
        let Some(base_url) = env_var("FILE_STORE_URL") else {
            tracing::info!("`FILE_STORE_URL` is not set, cover images will not be removed");
            return Ok(Self::Disabled);
        };

        Self::remote(&base_url, env_var("FILE_STORE_TOKEN"))
    }

    /// Create a remote file store, deletions go to `<base_url>/delete`
    pub fn remote(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)?;

        // keep the last path segment when joining
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let delete_endpoint = base_url.join("delete")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self::Remote {
            client,
            delete_endpoint,
            token,
        })
    }

    /// Remove a file, best effort
    ///
    /// Failures are logged and never returned, the caller continues regardless
    pub async fn delete(&self, url: &str) {
        let Self::Remote {
            client,
            delete_endpoint,
            token,
        } = self
        else {
            tracing::debug!("No file store configured, not removing {url}");
            return;
        };

        let mut request = client
            .post(delete_endpoint.clone())
            .json(&DeleteFileRequest { url });

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(_) => tracing::debug!("Removed {url} from the file store"),
            Err(err) => tracing::warn!("Could not remove {url} from the file store: {err}"),
        }
    }
}
