use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::email_provider::{AudienceSync, EmailProvider, OutgoingEmail},
    domain::entities::campaign::Campaign,
};

pub const KLAVIYO_API_BASE: &str = "https://a.klaviyo.com";

#[derive(Clone)]
pub struct KlaviyoConfig {
    pub api_base: String,
    pub api_key: SecretString,
    pub from_email: String,
    pub from_name: String,
    pub list_id: Option<String>,
    pub template_ids: HashMap<Campaign, String>,
}

/// Marketing-automation platform: template-based transactional sends and
/// list subscription.
#[derive(Clone)]
pub struct KlaviyoClient {
    client: Client,
    config: KlaviyoConfig,
}

#[derive(Serialize)]
struct TransactionalReq<'a> {
    from_email: &'a str,
    from_name: &'a str,
    subject: &'a str,
    to: [&'a str; 1],
    template_id: &'a str,
    context: &'a std::collections::BTreeMap<String, String>,
}

impl KlaviyoClient {
    pub fn new(client: Client, mut config: KlaviyoConfig) -> Self {
        config.api_base = config.api_base.trim_end_matches('/').to_string();
        Self { client, config }
    }

    pub fn has_list(&self) -> bool {
        self.config.list_id.is_some()
    }

    async fn post(&self, url: String, body: &impl Serialize) -> AppResult<()> {
        let response = self
            .client
            .post(url)
            .header("Api-Key", self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("Klaviyo request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!("Klaviyo API error: {status} - {text}")));
        }
        Ok(())
    }
}

#[async_trait]
impl EmailProvider for KlaviyoClient {
    fn name(&self) -> &'static str {
        "klaviyo"
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let template_id = self.config.template_ids.get(&email.campaign).ok_or_else(|| {
            AppError::NotConfigured(format!("Klaviyo template id for {}", email.campaign))
        })?;

        let body = TransactionalReq {
            from_email: &self.config.from_email,
            from_name: &self.config.from_name,
            subject: &email.subject,
            to: [&email.to],
            template_id,
            context: &email.variables,
        };
        self.post(format!("{}/api/v1/email", self.config.api_base), &body)
            .await
    }
}

#[async_trait]
impl AudienceSync for KlaviyoClient {
    async fn add_subscriber(&self, email: &str) -> AppResult<()> {
        let list_id = self
            .config
            .list_id
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("Klaviyo list id".into()))?;

        let body = json!({
            "profiles": [{ "email": email, "$consent": ["email"] }]
        });
        self.post(
            format!("{}/api/v2/list/{list_id}/subscribe", self.config.api_base),
            &body,
        )
        .await?;
        tracing::info!(email, list_id, "Added subscriber to Klaviyo list");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    use super::*;

    fn client(server: &MockServer) -> KlaviyoClient {
        KlaviyoClient::new(
            Client::new(),
            KlaviyoConfig {
                api_base: server.uri(),
                api_key: SecretString::new("pk_live".into()),
                from_email: "hello@itza.example".into(),
                from_name: "Itza".into(),
                list_id: Some("L1".into()),
                template_ids: HashMap::from([(Campaign::Confirmation, "T_CONF".to_string())]),
            },
        )
    }

    fn email(campaign: Campaign) -> OutgoingEmail {
        OutgoingEmail {
            to: "fan@mate.io".into(),
            campaign,
            subject: "Welcome".into(),
            html: String::new(),
            variables: BTreeMap::from([("first_name".to_string(), "fan".to_string())]),
        }
    }

    #[tokio::test]
    async fn transactional_send_uses_campaign_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/email"))
            .and(header("Api-Key", "pk_live"))
            .and(body_partial_json(json!({
                "to": ["fan@mate.io"],
                "template_id": "T_CONF",
                "from_email": "hello@itza.example",
                "context": { "first_name": "fan" }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).send(&email(Campaign::Confirmation)).await.unwrap();
    }

    #[tokio::test]
    async fn campaign_without_template_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server).send(&email(Campaign::Milestone)).await.unwrap_err();

        assert!(matches!(err, AppError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn list_subscribe_sends_consent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/list/L1/subscribe"))
            .and(body_partial_json(json!({
                "profiles": [{ "email": "fan@mate.io", "$consent": ["email"] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).add_subscriber("fan@mate.io").await.unwrap();
    }

    #[tokio::test]
    async fn api_failure_is_email_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client(&server).send(&email(Campaign::Confirmation)).await.unwrap_err();

        assert!(matches!(err, AppError::Email(_)));
    }
}
