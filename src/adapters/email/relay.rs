use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::email_provider::{EmailProvider, OutgoingEmail},
};

pub const RELAY_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub access_token: Option<SecretString>,
}

/// Email relay API (EmailJS-style). The relay renders its own template;
/// we only supply the recipient and substitution parameters.
#[derive(Clone)]
pub struct RelayEmailProvider {
    client: Client,
    config: RelayConfig,
}

impl RelayEmailProvider {
    pub fn new(client: Client, config: RelayConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Serialize)]
struct RelayReq<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: BTreeMap<&'a str, &'a str>,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

#[async_trait]
impl EmailProvider for RelayEmailProvider {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let mut template_params: BTreeMap<&str, &str> = email
            .variables
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        template_params.insert("to_email", &email.to);
        template_params.insert("email", &email.to);
        template_params.insert("subject", &email.subject);
        template_params.insert("template_type", email.campaign.as_ref());

        let token = self.config.access_token.as_ref().map(|t| t.expose_secret());
        let body = RelayReq {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.user_id,
            template_params,
            access_token: token,
        };

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Email(format!("Relay request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!("Relay API error ({status}): {text}")));
        }
        Ok(())
    }
}
