use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{email_provider::AudienceSync, email_queue::EmailQueue},
        use_cases::delivery::{DeliveryOutcome, EmailDelivery},
        validators::{normalize_email, parse_waitlist_email},
    },
    domain::entities::{
        campaign::Campaign,
        subscriber::{InsertOutcome, Subscriber},
    },
};

/// A waitlist backing store: local CSV, remote CSV, or document collection.
#[async_trait]
pub trait WaitlistRepo: Send + Sync {
    /// Short backend label for logs and admin responses.
    fn backend(&self) -> &'static str;

    async fn contains(&self, email: &str) -> AppResult<bool>;

    /// Stores a record. Stores with a unique index report `AlreadyPresent`
    /// instead of failing; scan-based stores simply append.
    async fn insert(&self, subscriber: &Subscriber) -> AppResult<InsertOutcome>;

    async fn list(&self) -> AppResult<Vec<Subscriber>>;

    /// Deletes every record for `email`; returns whether anything was removed.
    async fn remove(&self, email: &str) -> AppResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeStatus {
    Success,
    AlreadyRegistered,
    PartialSuccess,
}

impl SubscribeStatus {
    pub fn message(&self) -> &'static str {
        match self {
            SubscribeStatus::Success => {
                "You're on the waitlist! Check your email for confirmation."
            }
            SubscribeStatus::AlreadyRegistered => "You're already on our waitlist!",
            SubscribeStatus::PartialSuccess => {
                "You're on the waitlist! (Email confirmation failed)"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubscribeResult {
    pub email: String,
    pub status: SubscribeStatus,
    pub delivery: Option<DeliveryOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalReport {
    pub email: String,
    pub removed_from: Vec<&'static str>,
    pub purged_queue_files: usize,
}

#[derive(Clone)]
pub struct WaitlistUseCases {
    store: Arc<dyn WaitlistRepo>,
    backup: Option<Arc<dyn WaitlistRepo>>,
    audience: Option<Arc<dyn AudienceSync>>,
    delivery: Arc<EmailDelivery>,
    queue: Arc<dyn EmailQueue>,
}

impl WaitlistUseCases {
    pub fn new(
        store: Arc<dyn WaitlistRepo>,
        backup: Option<Arc<dyn WaitlistRepo>>,
        audience: Option<Arc<dyn AudienceSync>>,
        delivery: Arc<EmailDelivery>,
        queue: Arc<dyn EmailQueue>,
    ) -> Self {
        Self {
            store,
            backup,
            audience,
            delivery,
            queue,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Validates, deduplicates, stores, then sends the confirmation email.
    ///
    /// The store write is attempted before any email. A write that fails in
    /// every store is logged and the confirmation still goes out; the status
    /// reflects only the email outcome.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, raw_email: Option<&str>) -> AppResult<SubscribeResult> {
        let email = parse_waitlist_email(raw_email)?;

        if self.is_registered(&email).await {
            tracing::info!(email = %email, "Duplicate waitlist signup");
            return Ok(SubscribeResult {
                email,
                status: SubscribeStatus::AlreadyRegistered,
                delivery: None,
            });
        }

        let subscriber = Subscriber::new(&email).with_origin("subscribed", "website");
        match self.persist(&subscriber).await {
            Ok(InsertOutcome::AlreadyPresent) => {
                return Ok(SubscribeResult {
                    email,
                    status: SubscribeStatus::AlreadyRegistered,
                    delivery: None,
                });
            }
            Ok(InsertOutcome::Inserted) => {}
            Err(err) => {
                tracing::error!(
                    email = %email,
                    error = %err,
                    "Signup not persisted in any store, sending confirmation anyway"
                );
            }
        }

        if let Some(audience) = &self.audience
            && let Err(err) = audience.add_subscriber(&email).await
        {
            tracing::warn!(email = %email, error = %err, "Failed to sync subscriber to marketing list");
        }

        let outcome = self.delivery.deliver(&email, Campaign::Confirmation).await;
        let status = if outcome.is_sent() {
            SubscribeStatus::Success
        } else {
            SubscribeStatus::PartialSuccess
        };

        Ok(SubscribeResult {
            email,
            status,
            delivery: Some(outcome),
        })
    }

    /// Lookup used for duplicate detection. A failing store counts as "not found".
    pub async fn is_registered(&self, email: &str) -> bool {
        match self.store.contains(email).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(
                    backend = self.store.backend(),
                    error = %err,
                    "Duplicate check failed, treating as new signup"
                );
                false
            }
        }
    }

    async fn persist(&self, subscriber: &Subscriber) -> AppResult<InsertOutcome> {
        match self.store.insert(subscriber).await {
            Ok(InsertOutcome::AlreadyPresent) => Ok(InsertOutcome::AlreadyPresent),
            Ok(InsertOutcome::Inserted) => {
                if let Some(backup) = &self.backup
                    && let Err(err) = backup.insert(subscriber).await
                {
                    tracing::warn!(
                        backend = backup.backend(),
                        error = %err,
                        "Failed to mirror signup to backup store"
                    );
                }
                Ok(InsertOutcome::Inserted)
            }
            Err(err) => {
                tracing::error!(
                    backend = self.store.backend(),
                    email = %subscriber.email,
                    error = %err,
                    "Primary store write failed"
                );
                let Some(backup) = &self.backup else {
                    return Err(err);
                };
                backup.insert(subscriber).await.map_err(|backup_err| {
                    tracing::error!(
                        backend = backup.backend(),
                        error = %backup_err,
                        "Backup store write failed"
                    );
                    AppError::Storage(format!("{err}; backup: {backup_err}"))
                })
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> AppResult<Vec<Subscriber>> {
        match self.store.list().await {
            Ok(subscribers) => Ok(subscribers),
            Err(err) => {
                let Some(backup) = &self.backup else {
                    return Err(err);
                };
                tracing::warn!(error = %err, "Primary store listing failed, reading backup");
                backup.list().await
            }
        }
    }

    /// Removes an address from every configured store and drops its queued mail.
    #[instrument(skip(self))]
    pub async fn remove(&self, raw_email: &str) -> AppResult<RemovalReport> {
        let email = normalize_email(raw_email);
        if email.is_empty() {
            return Err(AppError::InvalidInput("Email is required".into()));
        }

        let mut removed_from = Vec::new();
        let mut last_error = None;
        let stores = std::iter::once(&self.store).chain(self.backup.iter());
        for store in stores {
            match store.remove(&email).await {
                Ok(true) => removed_from.push(store.backend()),
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(backend = store.backend(), error = %err, "Removal failed");
                    last_error = Some(err);
                }
            }
        }

        let purged_queue_files = match self.queue.purge_recipient(&email).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to purge queued email");
                0
            }
        };

        if removed_from.is_empty() {
            return Err(last_error.unwrap_or(AppError::NotFound));
        }

        tracing::info!(email = %email, stores = ?removed_from, "Removed from waitlist");
        Ok(RemovalReport {
            email,
            removed_from,
            purged_queue_files,
        })
    }
}
