use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        use_cases::{
            delivery::{DeliveryOutcome, EmailDelivery},
            waitlist::WaitlistUseCases,
        },
        validators::parse_waitlist_email,
    },
    domain::entities::campaign::Campaign,
};

#[derive(Debug, Clone, Default)]
pub struct CampaignRequest {
    pub campaign: Campaign,
    /// Single recipient; when set the waitlist is not read.
    pub email: Option<String>,
    /// Zero-based offset into the waitlist.
    pub start: usize,
    /// Window size; `None` sends to everyone from `start` on.
    pub batch: Option<usize>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CampaignReport {
    pub campaign: Campaign,
    pub total: usize,
    pub sent: usize,
    pub queued: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<String>>,
}

impl CampaignReport {
    fn record(&mut self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Sent { .. } => self.sent += 1,
            DeliveryOutcome::Queued { .. } => self.queued += 1,
            DeliveryOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Sends one campaign to many recipients, strictly one after another.
#[derive(Clone)]
pub struct CampaignUseCases {
    waitlist: WaitlistUseCases,
    delivery: Arc<EmailDelivery>,
    send_delay: Duration,
}

impl CampaignUseCases {
    pub fn new(waitlist: WaitlistUseCases, delivery: Arc<EmailDelivery>, send_delay: Duration) -> Self {
        Self {
            waitlist,
            delivery,
            send_delay,
        }
    }

    /// Sends a single campaign email through the delivery chain.
    #[instrument(skip(self))]
    pub async fn resend(&self, raw_email: &str, campaign: Campaign) -> AppResult<DeliveryOutcome> {
        let email = parse_waitlist_email(Some(raw_email))?;
        Ok(self.delivery.deliver(&email, campaign).await)
    }

    #[instrument(skip(self), fields(campaign = %request.campaign))]
    pub async fn run(&self, request: &CampaignRequest) -> AppResult<CampaignReport> {
        if request.batch == Some(0) {
            return Err(AppError::InvalidInput("batch must be at least 1".into()));
        }

        let recipients = self.recipients(request).await?;
        let mut report = CampaignReport {
            campaign: request.campaign,
            total: recipients.len(),
            ..Default::default()
        };

        if request.dry_run {
            tracing::info!(total = report.total, "Campaign dry run");
            report.recipients = Some(recipients);
            return Ok(report);
        }

        for (i, to) in recipients.iter().enumerate() {
            if i > 0 && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
            let outcome = self.delivery.deliver(to, request.campaign).await;
            report.record(&outcome);
        }

        tracing::info!(
            total = report.total,
            sent = report.sent,
            queued = report.queued,
            failed = report.failed,
            "Campaign finished"
        );
        Ok(report)
    }

    async fn recipients(&self, request: &CampaignRequest) -> AppResult<Vec<String>> {
        if let Some(email) = &request.email {
            return Ok(vec![parse_waitlist_email(Some(email))?]);
        }

        let subscribers = self.waitlist.list().await?;
        let window = subscribers
            .into_iter()
            .map(|s| s.email)
            .skip(request.start);
        Ok(match request.batch {
            Some(batch) => window.take(batch).collect(),
            None => window.collect(),
        })
    }
}
