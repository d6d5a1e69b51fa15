//! In-memory mocks for the waitlist store and the email queue.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::email_queue::{EmailQueue, PendingEntries, QueueEntry},
        use_cases::waitlist::WaitlistRepo,
    },
    domain::entities::{
        queued_email::QueuedEmail,
        subscriber::{InsertOutcome, Subscriber},
    },
};

// ============================================================================
// InMemoryWaitlistRepo
// ============================================================================

/// Waitlist store backed by a vector. Behaves like a uniquely indexed store:
/// inserting a known address reports `AlreadyPresent`.
pub struct InMemoryWaitlistRepo {
    name: &'static str,
    pub subscribers: Mutex<Vec<Subscriber>>,
    fail_contains: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for InMemoryWaitlistRepo {
    fn default() -> Self {
        Self::named("memory")
    }
}

impl InMemoryWaitlistRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            subscribers: Mutex::new(Vec::new()),
            fail_contains: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn seed(&self, email: &str) {
        self.subscribers.lock().unwrap().push(Subscriber::new(email));
    }

    pub fn emails(&self) -> Vec<String> {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.email.clone())
            .collect()
    }

    /// Makes `contains` and `list` fail.
    pub fn fail_contains(&self) {
        self.fail_contains.store(true, Ordering::SeqCst);
    }

    /// Makes `insert` and `remove` fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn read_guard(&self) -> AppResult<()> {
        if self.fail_contains.load(Ordering::SeqCst) {
            return Err(AppError::Storage("simulated read failure".into()));
        }
        Ok(())
    }

    fn write_guard(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl WaitlistRepo for InMemoryWaitlistRepo {
    fn backend(&self) -> &'static str {
        self.name
    }

    async fn contains(&self, email: &str) -> AppResult<bool> {
        self.read_guard()?;
        Ok(self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.email.eq_ignore_ascii_case(email)))
    }

    async fn insert(&self, subscriber: &Subscriber) -> AppResult<InsertOutcome> {
        self.write_guard()?;
        let mut subscribers = self.subscribers.lock().unwrap();
        if subscribers
            .iter()
            .any(|s| s.email.eq_ignore_ascii_case(&subscriber.email))
        {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        subscribers.push(subscriber.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn list(&self) -> AppResult<Vec<Subscriber>> {
        self.read_guard()?;
        Ok(self.subscribers.lock().unwrap().clone())
    }

    async fn remove(&self, email: &str) -> AppResult<bool> {
        self.write_guard()?;
        let mut subscribers = self.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|s| !s.email.eq_ignore_ascii_case(email));
        Ok(subscribers.len() != before)
    }
}

// ============================================================================
// InMemoryEmailQueue
// ============================================================================

#[derive(Default)]
pub struct InMemoryEmailQueue {
    pending: Mutex<Vec<QueueEntry>>,
    pub processed: Mutex<Vec<QueuedEmail>>,
    pub failed: Mutex<Vec<String>>,
    fail: bool,
}

impl InMemoryEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queued(&self) -> Vec<QueuedEmail> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.email.clone())
            .collect()
    }

    /// Adds a pending entry without going through `enqueue`.
    pub fn push(&self, email: QueuedEmail) {
        let mut pending = self.pending.lock().unwrap();
        let id = format!("{}-{}", pending.len(), email.file_name());
        pending.push(QueueEntry { id, email });
    }

    fn take(&self, id: &str) -> Option<QueueEntry> {
        let mut pending = self.pending.lock().unwrap();
        let pos = pending.iter().position(|e| e.id == id)?;
        Some(pending.remove(pos))
    }
}

#[async_trait]
impl EmailQueue for InMemoryEmailQueue {
    async fn enqueue(&self, email: &QueuedEmail) -> AppResult<String> {
        if self.fail {
            return Err(AppError::Storage("simulated queue failure".into()));
        }
        let mut pending = self.pending.lock().unwrap();
        let id = format!("{}-{}", pending.len(), email.file_name());
        pending.push(QueueEntry {
            id: id.clone(),
            email: email.clone(),
        });
        Ok(format!("memory://{id}"))
    }

    async fn pending(&self) -> AppResult<PendingEntries> {
        Ok(PendingEntries {
            entries: self.pending.lock().unwrap().clone(),
            unreadable: vec![],
        })
    }

    async fn mark_processed(&self, id: &str, email: Option<&QueuedEmail>) -> AppResult<()> {
        let entry = self.take(id).ok_or(AppError::NotFound)?;
        let settled = email.cloned().unwrap_or(entry.email);
        self.processed.lock().unwrap().push(settled);
        Ok(())
    }

    async fn mark_failed(&self, id: &str, _email: Option<&QueuedEmail>) -> AppResult<()> {
        self.take(id);
        self.failed.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn purge_recipient(&self, email: &str) -> AppResult<usize> {
        let mut pending = self.pending.lock().unwrap();
        let before = pending.len();
        pending.retain(|e| !e.email.to.eq_ignore_ascii_case(email));
        Ok(before - pending.len())
    }
}
