use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use secrecy::ExposeSecret;
use serde_json::json;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    infra::stripe_client::{StripeClient, StripeWebhookEvent},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe-webhook", post(stripe_webhook))
}

#[tracing::instrument(name = "stripe_webhook", skip_all)]
async fn stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let secret = app_state
        .config
        .stripe
        .webhook_secret
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Stripe webhook secret".into()))?;

    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InvalidInput("Missing Stripe-Signature header".into()))?;

    StripeClient::verify_webhook_signature(&body, signature, secret.expose_secret())?;

    let event: StripeWebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {e}")))?;

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let intent = event.get_payment_intent();
            tracing::info!(
                event_id = %event.id,
                payment_intent_id = intent.as_ref().map(|pi| pi.id.as_str()).unwrap_or_default(),
                amount = intent.as_ref().map(|pi| pi.amount).unwrap_or_default(),
                "Payment succeeded"
            );
        }
        "payment_intent.payment_failed" => {
            let intent = event.get_payment_intent();
            let reason = intent
                .as_ref()
                .and_then(|pi| pi.last_payment_error.as_ref())
                .and_then(|e| e.message.clone())
                .unwrap_or_default();
            tracing::warn!(
                event_id = %event.id,
                payment_intent_id = intent.as_ref().map(|pi| pi.id.as_str()).unwrap_or_default(),
                %reason,
                "Payment failed"
            );
        }
        other => {
            tracing::debug!(event_id = %event.id, event_type = other, "Ignoring Stripe event");
        }
    }

    Ok(Json(json!({ "received": true })))
}
