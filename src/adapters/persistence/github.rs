use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::persistence::{csv_append, csv_contains, csv_without, parse_csv},
    app_error::{AppError, AppResult},
    application::use_cases::waitlist::WaitlistRepo,
    domain::entities::subscriber::{InsertOutcome, Subscriber},
};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Location of the waitlist CSV inside a repository.
#[derive(Debug, Clone)]
pub struct GitHubFile {
    pub owner: String,
    pub repo: String,
    pub path: String,
}

/// Waitlist CSV stored in a GitHub repository and edited through the
/// contents API. Every write is a commit guarded by the blob sha.
#[derive(Clone)]
pub struct GitHubCsvStore {
    client: Client,
    api_base: String,
    token: SecretString,
    file: GitHubFile,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    sha: String,
}

#[derive(Debug, Serialize)]
struct UpdateContents<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// Current file text plus the sha needed to replace it.
struct RemoteFile {
    content: String,
    sha: Option<String>,
}

impl GitHubCsvStore {
    pub fn new(client: Client, api_base: &str, token: SecretString, file: GitHubFile) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            file,
        }
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.file.owner, self.file.repo, self.file.path
        )
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.contents_url())
            .header("Authorization", format!("token {}", self.token.expose_secret()))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "waitlist-api")
    }

    async fn fetch(&self) -> AppResult<RemoteFile> {
        let response = self
            .request(reqwest::Method::GET)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("GitHub request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RemoteFile {
                content: String::new(),
                sha: None,
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("GitHub returned {status}: {body}")));
        }

        let file: ContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("GitHub response parse failed: {e}")))?;

        let content = match file.content {
            Some(encoded) => decode_content(&encoded)?,
            None => String::new(),
        };
        Ok(RemoteFile {
            content,
            sha: Some(file.sha),
        })
    }

    async fn put(&self, content: &str, sha: Option<&str>, message: String) -> AppResult<()> {
        let body = UpdateContents {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            sha,
        };
        let response = self
            .request(reqwest::Method::PUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("GitHub request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("GitHub update returned {status}: {body}")));
        }
        Ok(())
    }
}

/// The contents API wraps base64 at 60 columns.
fn decode_content(encoded: &str) -> AppResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| AppError::Storage(format!("GitHub content is not base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::Storage(format!("GitHub content is not UTF-8: {e}")))
}

#[async_trait]
impl WaitlistRepo for GitHubCsvStore {
    fn backend(&self) -> &'static str {
        "github"
    }

    async fn contains(&self, email: &str) -> AppResult<bool> {
        let file = self.fetch().await?;
        Ok(csv_contains(&file.content, email))
    }

    async fn insert(&self, subscriber: &Subscriber) -> AppResult<InsertOutcome> {
        let file = self.fetch().await?;
        let updated = csv_append(&file.content, subscriber);
        self.put(
            &updated,
            file.sha.as_deref(),
            format!("Add email: {}", subscriber.email),
        )
        .await?;
        tracing::info!(email = %subscriber.email, path = %self.file.path, "Committed signup to GitHub");
        Ok(InsertOutcome::Inserted)
    }

    async fn list(&self) -> AppResult<Vec<Subscriber>> {
        Ok(parse_csv(&self.fetch().await?.content))
    }

    async fn remove(&self, email: &str) -> AppResult<bool> {
        let file = self.fetch().await?;
        let Some(updated) = csv_without(&file.content, email) else {
            return Ok(false);
        };
        self.put(&updated, file.sha.as_deref(), format!("Remove email: {email}"))
            .await?;
        Ok(true)
    }
}
