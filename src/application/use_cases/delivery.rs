use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::{
    application::{
        email_templates::EmailTemplates,
        ports::{
            email_provider::{EmailProvider, OutgoingEmail},
            email_queue::EmailQueue,
        },
    },
    domain::entities::{campaign::Campaign, queued_email::QueuedEmail},
};

/// What happened to one email after the provider chain ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent { provider: &'static str },
    Queued { location: String },
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }
}

/// Runs the fixed provider fallback chain, parking the email in the local
/// queue once every provider has failed.
pub struct EmailDelivery {
    providers: Vec<Arc<dyn EmailProvider>>,
    queue: Arc<dyn EmailQueue>,
    templates: EmailTemplates,
}

impl EmailDelivery {
    pub fn new(
        providers: Vec<Arc<dyn EmailProvider>>,
        queue: Arc<dyn EmailQueue>,
        templates: EmailTemplates,
    ) -> Self {
        Self {
            providers,
            queue,
            templates,
        }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    #[instrument(skip(self))]
    pub async fn deliver(&self, to: &str, campaign: Campaign) -> DeliveryOutcome {
        let email = self.templates.render(to, campaign).await;
        self.deliver_rendered(&email).await
    }

    /// Provider chain plus queue fallback for an already rendered email.
    pub async fn deliver_rendered(&self, email: &OutgoingEmail) -> DeliveryOutcome {
        let last_error = match self.send_via_providers(email).await {
            Ok(provider) => return DeliveryOutcome::Sent { provider },
            Err(reason) => reason,
        };

        tracing::warn!(
            to = %email.to,
            campaign = %email.campaign,
            error = %last_error,
            "All email providers failed, queueing"
        );

        let queued = QueuedEmail::new(
            &email.to,
            &email.subject,
            &email.html,
            email.campaign,
            email.variables.clone(),
        );
        match self.queue.enqueue(&queued).await {
            Ok(location) => DeliveryOutcome::Queued { location },
            Err(err) => {
                tracing::error!(to = %email.to, error = %err, "Failed to queue email");
                DeliveryOutcome::Failed {
                    reason: format!("{last_error}; queue write failed: {err}"),
                }
            }
        }
    }

    /// Tries each provider once, in order. Never queues.
    pub async fn send_via_providers(&self, email: &OutgoingEmail) -> Result<&'static str, String> {
        let mut last_error = String::from("no email provider configured");
        for provider in &self.providers {
            match provider.send(email).await {
                Ok(()) => {
                    tracing::info!(
                        to = %email.to,
                        campaign = %email.campaign,
                        provider = provider.name(),
                        "Email sent"
                    );
                    return Ok(provider.name());
                }
                Err(err) => {
                    tracing::warn!(
                        to = %email.to,
                        provider = provider.name(),
                        error = %err,
                        "Email provider failed, trying next"
                    );
                    last_error = format!("{}: {err}", provider.name());
                }
            }
        }
        Err(last_error)
    }
}

impl From<&QueuedEmail> for OutgoingEmail {
    fn from(queued: &QueuedEmail) -> Self {
        OutgoingEmail {
            to: queued.to.clone(),
            campaign: queued.campaign,
            subject: queued.subject.clone(),
            html: queued.html.clone(),
            variables: queued.variables.clone(),
        }
    }
}
