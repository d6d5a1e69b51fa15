use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{CreatePaymentIntent, PaymentProvider},
    domain::entities::payment_intent::{PaymentIntent, PaymentIntentStatus},
};

pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Webhook timestamps older than this are rejected.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_base: String,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(client: Client, api_base: &str, secret_key: SecretString) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    /// Appends percent-encoded path segments to the API base.
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| AppError::Internal(format!("invalid Stripe API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Stripe API base cannot take a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ========================================================================
    // Payment Intents
    // ========================================================================

    pub async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> AppResult<StripePaymentIntent> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), params.amount.to_string()),
            ("currency".into(), params.currency.to_lowercase()),
            ("description".into(), params.description.clone()),
        ];
        for (i, method) in params.payment_method_types.iter().enumerate() {
            form.push((format!("payment_method_types[{i}]"), method.clone()));
        }
        if let Some(email) = &params.receipt_email {
            form.push(("receipt_email".into(), email.clone()));
        }
        if let Some(method) = &params.payment_method_id {
            form.push(("payment_method".into(), method.clone()));
            form.push(("confirm".into(), "true".into()));
        }

        let response = self
            .client
            .post(self.endpoint(&["payment_intents"])?)
            .header("Authorization", self.auth_header())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    pub async fn confirm_payment_intent(
        &self,
        payment_intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> AppResult<StripePaymentIntent> {
        let mut form: Vec<(&str, &str)> = Vec::new();
        if let Some(method) = payment_method_id {
            form.push(("payment_method", method));
        }

        let response = self
            .client
            .post(self.endpoint(&["payment_intents", payment_intent_id, "confirm"])?)
            .header("Authorization", self.auth_header())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Webhook Signature Verification
    // ========================================================================

    pub fn verify_webhook_signature(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
    ) -> AppResult<()> {
        Self::verify_webhook_signature_at(
            payload,
            signature_header,
            webhook_secret,
            chrono::Utc::now().timestamp(),
        )
    }

    pub fn verify_webhook_signature_at(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
        now: i64,
    ) -> AppResult<()> {
        // Header format: "t=timestamp,v1=signature,..."
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| AppError::InvalidInput("Missing timestamp in signature".into()))?;

        if signatures.is_empty() {
            return Err(AppError::InvalidInput("Missing signature".into()));
        }

        let expected = sign_payload(timestamp, payload, webhook_secret)?;

        if !signatures.iter().any(|sig| constant_time_compare(sig, &expected)) {
            return Err(AppError::InvalidInput("Invalid signature".into()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::InvalidInput("Invalid timestamp".into()))?;
        if (now - ts).abs() > WEBHOOK_TOLERANCE_SECS {
            return Err(AppError::InvalidInput("Timestamp too old".into()));
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Payment(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(AppError::Payment(
                    error.error.message.unwrap_or(error.error.error_type),
                ));
            }

            return Err(AppError::Payment(format!(
                "Stripe API error: {} - {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Internal(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn sign_payload(timestamp: &str, payload: &str, secret: &str) -> AppResult<String> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC error".into()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(&self, params: &CreatePaymentIntent) -> AppResult<PaymentIntent> {
        StripeClient::create_payment_intent(self, params)
            .await
            .map(PaymentIntent::from)
    }

    async fn confirm_payment_intent(
        &self,
        payment_intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> AppResult<PaymentIntent> {
        StripeClient::confirm_payment_intent(self, payment_intent_id, payment_method_id)
            .await
            .map(PaymentIntent::from)
    }
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub last_payment_error: Option<StripeError>,
}

impl From<StripePaymentIntent> for PaymentIntent {
    fn from(pi: StripePaymentIntent) -> Self {
        PaymentIntent {
            id: pi.id,
            status: pi.status,
            client_secret: pi.client_secret,
            amount: pi.amount,
            currency: pi.currency,
            last_error: pi
                .last_payment_error
                .map(|e| e.message.unwrap_or(e.error_type)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
    pub code: Option<String>,
}

// ============================================================================
// Webhook Event Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeWebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEventData {
    pub object: serde_json::Value,
}

impl StripeWebhookEvent {
    pub fn get_payment_intent(&self) -> Option<StripePaymentIntent> {
        serde_json::from_value(self.data.object.clone()).ok()
    }
}
