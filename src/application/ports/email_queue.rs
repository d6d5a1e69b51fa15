use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::queued_email::QueuedEmail};

/// A queued message together with the handle used to settle it.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: String,
    pub email: QueuedEmail,
}

/// A pending entry whose payload could not be read back.
#[derive(Debug, Clone)]
pub struct UnreadableEntry {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct PendingEntries {
    pub entries: Vec<QueueEntry>,
    pub unreadable: Vec<UnreadableEntry>,
}

/// Durable local store for undelivered email.
#[async_trait]
pub trait EmailQueue: Send + Sync {
    /// Parks a message; returns a human-readable location for logs and responses.
    async fn enqueue(&self, email: &QueuedEmail) -> AppResult<String>;

    async fn pending(&self) -> AppResult<PendingEntries>;

    /// Moves an entry out of the pending set after a successful resend.
    async fn mark_processed(&self, id: &str, email: Option<&QueuedEmail>) -> AppResult<()>;

    /// Moves an entry out of the pending set after a failed resend.
    async fn mark_failed(&self, id: &str, email: Option<&QueuedEmail>) -> AppResult<()>;

    /// Deletes pending entries addressed to `email`; returns how many were removed.
    async fn purge_recipient(&self, email: &str) -> AppResult<usize>;
}
