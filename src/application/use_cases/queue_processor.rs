use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::{
    app_error::AppResult,
    application::{
        ports::{email_provider::OutgoingEmail, email_queue::EmailQueue},
        use_cases::delivery::EmailDelivery,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueReport {
    pub processed: usize,
    pub failed: usize,
}

/// Drains the local email queue through the provider chain.
#[derive(Clone)]
pub struct QueueProcessor {
    queue: Arc<dyn EmailQueue>,
    delivery: Arc<EmailDelivery>,
}

impl QueueProcessor {
    pub fn new(queue: Arc<dyn EmailQueue>, delivery: Arc<EmailDelivery>) -> Self {
        Self { queue, delivery }
    }

    /// One pass over the pending entries. Each entry is tried once and then
    /// settled; nothing is put back in the queue. A settle failure is logged
    /// and the pass moves on; the entry stays pending for the next run.
    #[instrument(skip(self))]
    pub async fn process(&self) -> AppResult<QueueReport> {
        let pending = self.queue.pending().await?;
        let mut report = QueueReport::default();

        for bad in pending.unreadable {
            tracing::warn!(id = %bad.id, reason = %bad.reason, "Unreadable queue entry");
            if let Err(err) = self.queue.mark_failed(&bad.id, None).await {
                tracing::error!(id = %bad.id, error = %err, "Failed to move entry to failed");
            }
            report.failed += 1;
        }

        for entry in pending.entries {
            let mut email = entry.email;
            email.attempts += 1;

            let outgoing = OutgoingEmail::from(&email);
            match self.delivery.send_via_providers(&outgoing).await {
                Ok(provider) => {
                    tracing::info!(id = %entry.id, to = %email.to, provider, "Queued email delivered");
                    if let Err(err) = self.queue.mark_processed(&entry.id, Some(&email)).await {
                        tracing::error!(id = %entry.id, error = %err, "Failed to move entry to processed");
                    }
                    report.processed += 1;
                }
                Err(reason) => {
                    tracing::warn!(id = %entry.id, to = %email.to, %reason, "Queued email failed again");
                    if let Err(err) = self.queue.mark_failed(&entry.id, Some(&email)).await {
                        tracing::error!(id = %entry.id, error = %err, "Failed to move entry to failed");
                    }
                    report.failed += 1;
                }
            }
        }

        tracing::info!(processed = report.processed, failed = report.failed, "Queue pass finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        adapters::queue::FileEmailQueue,
        application::{email_templates::EmailTemplates, ports::email_provider::EmailProvider},
        domain::entities::{campaign::Campaign, queued_email::QueuedEmail},
        test_utils::{FailingEmailProvider, RecordingEmailProvider},
    };

    fn processor(root: &TempDir, provider: Arc<dyn EmailProvider>) -> (QueueProcessor, Arc<FileEmailQueue>) {
        let queue = Arc::new(FileEmailQueue::new(root.path()));
        let delivery = Arc::new(EmailDelivery::new(
            vec![provider],
            queue.clone(),
            EmailTemplates::new(root.path().join("templates"), "Itza", ""),
        ));
        (QueueProcessor::new(queue.clone(), delivery), queue)
    }

    fn queued(to: &str) -> QueuedEmail {
        QueuedEmail::new(to, "Subject", "<p>body</p>", Campaign::Update, BTreeMap::new())
    }

    fn names(dir: std::path::PathBuf) -> Vec<String> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => vec![],
        }
    }

    #[tokio::test]
    async fn delivered_entries_move_to_processed() {
        let root = TempDir::new().unwrap();
        let provider = Arc::new(RecordingEmailProvider::new("smtp"));
        let (processor, queue) = processor(&root, provider.clone());
        queue.enqueue(&queued("a@x.io")).await.unwrap();

        let report = processor.process().await.unwrap();

        assert_eq!(report, QueueReport { processed: 1, failed: 0 });
        assert!(names(root.path().join("queue")).is_empty());
        let processed = names(root.path().join("processed"));
        assert_eq!(processed.len(), 1);
        let body = std::fs::read_to_string(root.path().join("processed").join(&processed[0])).unwrap();
        let stored: QueuedEmail = serde_json::from_str(&body).unwrap();
        assert_eq!(stored.attempts, 1);
        assert_eq!(provider.captured_emails()[0].html, "<p>body</p>");
    }

    #[tokio::test]
    async fn failures_and_garbage_move_to_failed() {
        let root = TempDir::new().unwrap();
        let (processor, queue) = processor(&root, Arc::new(FailingEmailProvider::new("smtp")));
        queue.enqueue(&queued("a@x.io")).await.unwrap();
        std::fs::write(root.path().join("queue").join("broken.json"), "{not json").unwrap();

        let report = processor.process().await.unwrap();

        assert_eq!(report, QueueReport { processed: 0, failed: 2 });
        assert!(names(root.path().join("queue")).is_empty());
        assert_eq!(names(root.path().join("failed")).len(), 2);
    }

    #[tokio::test]
    async fn settle_failure_does_not_stop_the_pass() {
        let root = TempDir::new().unwrap();
        let provider = Arc::new(RecordingEmailProvider::new("smtp"));
        let (processor, queue) = processor(&root, provider.clone());
        queue.enqueue(&queued("a@x.io")).await.unwrap();
        queue.enqueue(&queued("b@x.io")).await.unwrap();
        std::fs::write(root.path().join("processed"), "not a directory").unwrap();

        let report = processor.process().await.unwrap();

        assert_eq!(report, QueueReport { processed: 2, failed: 0 });
        assert_eq!(provider.captured_emails().len(), 2);
        assert_eq!(names(root.path().join("queue")).len(), 2);
    }

    #[tokio::test]
    async fn empty_queue_is_a_no_op() {
        let root = TempDir::new().unwrap();
        let (processor, _) = processor(&root, Arc::new(RecordingEmailProvider::new("smtp")));

        let report = processor.process().await.unwrap();

        assert_eq!(report, QueueReport::default());
    }
}
