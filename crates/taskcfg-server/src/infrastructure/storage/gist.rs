//! GitHub gist backend.
//!
//! The document lives in one named file of an existing gist:
//!
//! ```text
//! read   GET   {api_base}/gists/{id}       → files[file_name].content
//! write  PATCH {api_base}/gists/{id}       ← {"files":{file_name:{"content":…}}}
//! ```
//!
//! Both requests carry `Authorization: token <token>` and the v3 media type.
//! The gist id and token come from the environment; when either is missing
//! every call fails with [`StoreError::Misconfigured`] and no request is sent.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use taskcfg_core::to_pretty_string;
use tracing::debug;

use crate::application::config_store::{ConfigStore, StoreError};
use crate::domain::config::GistSettings;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Content used when the gist has no such file, or the file is empty.
/// It fails shape validation downstream, which is what the user should see.
const MISSING_FILE_CONTENT: &str = "{}";

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

/// [`ConfigStore`] backed by one file of a GitHub gist.
#[derive(Debug, Clone)]
pub struct GistStore {
    settings: GistSettings,
    client: Client,
}

impl GistStore {
    /// Builds the store and its HTTP client.
    ///
    /// # Errors
    ///
    /// [`StoreError::Transport`] if the TLS backend cannot be initialised.
    pub fn new(settings: GistSettings) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("taskcfg-server/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self { settings, client })
    }

    fn credentials(&self) -> Result<(&str, &str), StoreError> {
        match (
            self.settings.gist_id.as_deref().filter(|s| !s.is_empty()),
            self.settings.token.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(id), Some(token)) => Ok((id, token)),
            _ => Err(StoreError::Misconfigured(format!(
                "missing {}",
                self.settings.missing_credentials().join(" and ")
            ))),
        }
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{id}", self.settings.api_base.trim_end_matches('/'))
    }

    fn authorised(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("token {token}"))
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
    }
}

/// Maps a non-2xx response to [`StoreError::Remote`].
async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GitHubErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);
    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

#[async_trait]
impl ConfigStore for GistStore {
    async fn read(&self) -> Result<Value, StoreError> {
        let (id, token) = self.credentials()?;
        let url = self.gist_url(id);

        let response = self
            .authorised(self.client.get(&url), token)
            .send()
            .await
            .map_err(transport)?;
        let gist: GistResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Corrupt {
                location: url.clone(),
                message: e.to_string(),
            })?;

        let content = gist
            .files
            .get(&self.settings.file_name)
            .and_then(|f| f.content.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(MISSING_FILE_CONTENT);
        debug!(gist = id, file = %self.settings.file_name, bytes = content.len(), "fetched gist file");

        serde_json::from_str(content).map_err(|e| StoreError::Corrupt {
            location: format!("gist {id}/{}", self.settings.file_name),
            message: e.to_string(),
        })
    }

    async fn write(&self, blob: &Value) -> Result<(), StoreError> {
        let (id, token) = self.credentials()?;

        let mut files = Map::new();
        files.insert(
            self.settings.file_name.clone(),
            json!({ "content": to_pretty_string(blob) }),
        );
        let body = json!({ "files": files });

        let response = self
            .authorised(self.client.patch(self.gist_url(id)), token)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        debug!(gist = id, file = %self.settings.file_name, "updated gist file");
        Ok(())
    }

    fn describe(&self) -> String {
        match self.settings.gist_id.as_deref() {
            Some(id) if !id.is_empty() => format!("gist {id} ({})", self.settings.file_name),
            _ => format!("gist <unset> ({})", self.settings.file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(id: Option<&str>, token: Option<&str>) -> GistSettings {
        GistSettings {
            // Port 9 (discard) is never contacted: these tests fail before sending.
            api_base: "http://127.0.0.1:9".to_string(),
            gist_id: id.map(str::to_string),
            token: token.map(str::to_string),
            ..GistSettings::default()
        }
    }

    #[tokio::test]
    async fn test_read_without_token_is_misconfigured() {
        let store = GistStore::new(settings(Some("abc"), None)).unwrap();

        let result = store.read().await;

        match result {
            Err(StoreError::Misconfigured(msg)) => assert_eq!(msg, "missing GITHUB_TOKEN"),
            other => panic!("expected Misconfigured, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_without_any_credentials_is_misconfigured() {
        let store = GistStore::new(settings(None, None)).unwrap();

        let result = store.write(&json!({})).await;

        match result {
            Err(StoreError::Misconfigured(msg)) => {
                assert_eq!(msg, "missing GITHUB_TOKEN and GIST_ID")
            }
            other => panic!("expected Misconfigured, got {other:?}"),
        }
    }

    #[test]
    fn test_gist_url_tolerates_trailing_slash() {
        let mut cfg = settings(Some("abc"), Some("t"));
        cfg.api_base = "https://api.github.com/".to_string();
        let store = GistStore::new(cfg).unwrap();

        assert_eq!(store.gist_url("abc"), "https://api.github.com/gists/abc");
    }

    #[test]
    fn test_describe_never_mentions_token() {
        let store = GistStore::new(settings(Some("abc"), Some("ghp_secret"))).unwrap();

        let text = store.describe();

        assert_eq!(text, "gist abc (config.json)");
        assert!(!text.contains("ghp_secret"));
    }
}
