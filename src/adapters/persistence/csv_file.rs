use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    adapters::persistence::{CSV_HEADER, csv_append, csv_contains, csv_without, parse_csv},
    app_error::{AppError, AppResult},
    application::use_cases::waitlist::WaitlistRepo,
    domain::entities::subscriber::{InsertOutcome, Subscriber},
};

/// Waitlist kept in a CSV file on local disk. Also serves as the backup
/// store for the remote backends.
#[derive(Debug, Clone)]
pub struct LocalCsvStore {
    path: PathBuf,
}

impl LocalCsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File content, or `None` when the file does not exist yet.
    async fn read(&self) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, content: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl WaitlistRepo for LocalCsvStore {
    fn backend(&self) -> &'static str {
        "local_csv"
    }

    async fn contains(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .read()
            .await?
            .is_some_and(|content| csv_contains(&content, email)))
    }

    async fn insert(&self, subscriber: &Subscriber) -> AppResult<InsertOutcome> {
        let content = match self.read().await? {
            Some(content) => content,
            None => format!("{CSV_HEADER}\n"),
        };
        self.write(&csv_append(&content, subscriber)).await?;
        tracing::debug!(path = %self.path.display(), email = %subscriber.email, "Appended to local CSV");
        Ok(InsertOutcome::Inserted)
    }

    async fn list(&self) -> AppResult<Vec<Subscriber>> {
        Ok(self
            .read()
            .await?
            .map(|content| parse_csv(&content))
            .unwrap_or_default())
    }

    async fn remove(&self, email: &str) -> AppResult<bool> {
        let Some(content) = self.read().await? else {
            return Ok(false);
        };
        match csv_without(&content, email) {
            Some(updated) => {
                self.write(&updated).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
