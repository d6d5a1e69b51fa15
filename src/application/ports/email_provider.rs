use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::campaign::Campaign};

/// A fully rendered email, ready for any provider in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub campaign: Campaign,
    pub subject: String,
    pub html: String,
    /// Substitution variables for providers that render their own templates.
    pub variables: BTreeMap<String, String>,
}

/// One delivery path (Klaviyo, relay API, SMTP). Each call is a single attempt.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

/// Adds signups to an external marketing list. Best effort only.
#[async_trait]
pub trait AudienceSync: Send + Sync {
    async fn add_subscriber(&self, email: &str) -> AppResult<()>;
}
