use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::campaign::Campaign;

/// An email that no provider accepted, parked on disk for a later retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(default)]
    pub campaign: Campaign,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub attempts: u32,
}

impl QueuedEmail {
    pub fn new(
        to: &str,
        subject: &str,
        html: &str,
        campaign: Campaign,
        variables: BTreeMap<String, String>,
    ) -> Self {
        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
            campaign,
            variables,
            timestamp: Utc::now().naive_utc(),
            attempts: 0,
        }
    }

    /// Queue file name: `{campaign}_{timestamp}_{recipient}.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            self.campaign.as_ref(),
            self.timestamp.format("%Y%m%d%H%M%S%3f"),
            file_safe_recipient(&self.to)
        )
    }
}

/// `@` becomes `_at_`; anything outside `[A-Za-z0-9._-]` becomes `_`.
fn file_safe_recipient(to: &str) -> String {
    to.replace('@', "_at_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
