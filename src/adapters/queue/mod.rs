use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::email_queue::{EmailQueue, PendingEntries, QueueEntry, UnreadableEntry},
    domain::entities::queued_email::QueuedEmail,
};

const PENDING_DIR: &str = "queue";
const PROCESSED_DIR: &str = "processed";
const FAILED_DIR: &str = "failed";

/// Email queue kept as one pretty-printed JSON file per message.
///
/// Layout under the root: `queue/` (pending), `processed/`, `failed/`.
/// Entry ids are file names inside `queue/`.
#[derive(Debug, Clone)]
pub struct FileEmailQueue {
    root: PathBuf,
}

impl FileEmailQueue {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn pending_dir(&self) -> PathBuf {
        self.root.join(PENDING_DIR)
    }

    async fn ensure_dir(path: &Path) -> AppResult<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| AppError::Storage(format!("create {}: {e}", path.display())))
    }

    /// Rejects ids that would escape the pending directory.
    fn pending_path(&self, id: &str) -> AppResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(AppError::InvalidInput(format!("invalid queue entry id: {id}")));
        }
        Ok(self.pending_dir().join(id))
    }

    async fn settle(&self, id: &str, email: Option<&QueuedEmail>, target: &str) -> AppResult<()> {
        let source = self.pending_path(id)?;
        let target_dir = self.root.join(target);
        Self::ensure_dir(&target_dir).await?;
        let dest = target_dir.join(id);

        match email {
            Some(email) => {
                write_json(&dest, email).await?;
                tokio::fs::remove_file(&source)
                    .await
                    .map_err(|e| AppError::Storage(format!("remove {}: {e}", source.display())))
            }
            None => tokio::fs::rename(&source, &dest)
                .await
                .map_err(|e| AppError::Storage(format!("move {}: {e}", source.display()))),
        }
    }

    async fn json_files(&self) -> AppResult<Vec<PathBuf>> {
        let dir = self.pending_dir();
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(AppError::Storage(format!("read {}: {e}", dir.display()))),
        };

        let mut files = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(format!("read {}: {e}", dir.display())))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

async fn write_json(path: &Path, email: &QueuedEmail) -> AppResult<()> {
    let body = serde_json::to_string_pretty(email)
        .map_err(|e| AppError::Internal(format!("serialize queued email: {e}")))?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| AppError::Storage(format!("write {}: {e}", path.display())))
}

fn file_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl EmailQueue for FileEmailQueue {
    async fn enqueue(&self, email: &QueuedEmail) -> AppResult<String> {
        let dir = self.pending_dir();
        Self::ensure_dir(&dir).await?;
        let path = dir.join(email.file_name());
        write_json(&path, email).await?;
        tracing::info!(path = %path.display(), to = %email.to, "Email queued");
        Ok(path.display().to_string())
    }

    async fn pending(&self) -> AppResult<PendingEntries> {
        let mut pending = PendingEntries::default();
        for path in self.json_files().await? {
            let id = file_id(&path);
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    pending.unreadable.push(UnreadableEntry {
                        id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            match serde_json::from_str::<QueuedEmail>(&raw) {
                Ok(email) => pending.entries.push(QueueEntry { id, email }),
                Err(e) => pending.unreadable.push(UnreadableEntry {
                    id,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(pending)
    }

    async fn mark_processed(&self, id: &str, email: Option<&QueuedEmail>) -> AppResult<()> {
        self.settle(id, email, PROCESSED_DIR).await
    }

    async fn mark_failed(&self, id: &str, email: Option<&QueuedEmail>) -> AppResult<()> {
        self.settle(id, email, FAILED_DIR).await
    }

    async fn purge_recipient(&self, email: &str) -> AppResult<usize> {
        let mut purged = 0;
        for path in self.json_files().await? {
            let Ok(raw) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            let Ok(queued) = serde_json::from_str::<QueuedEmail>(&raw) else {
                continue;
            };
            if queued.to.eq_ignore_ascii_case(email) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| AppError::Storage(format!("remove {}: {e}", path.display())))?;
                purged += 1;
            }
        }
        if purged > 0 {
            tracing::info!(email, purged, "Purged queued email");
        }
        Ok(purged)
    }
}
