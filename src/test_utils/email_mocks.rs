//! Mocks for the email provider and marketing-list ports.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::email_provider::{AudienceSync, EmailProvider, OutgoingEmail},
};

/// Accepts every email and keeps a copy.
pub struct RecordingEmailProvider {
    name: &'static str,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingEmailProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn captured_emails(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailProvider for RecordingEmailProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Rejects every email, counting attempts.
pub struct FailingEmailProvider {
    name: &'static str,
    attempts: AtomicUsize,
}

impl FailingEmailProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailProvider for FailingEmailProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, _email: &OutgoingEmail) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Email(format!("{} unavailable", self.name)))
    }
}

#[derive(Default)]
pub struct RecordingAudienceSync {
    added: Mutex<Vec<String>>,
}

impl RecordingAudienceSync {
    pub fn added(&self) -> Vec<String> {
        self.added.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudienceSync for RecordingAudienceSync {
    async fn add_subscriber(&self, email: &str) -> AppResult<()> {
        self.added.lock().unwrap().push(email.to_string());
        Ok(())
    }
}
