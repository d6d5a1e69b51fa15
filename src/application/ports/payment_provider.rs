use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::payment_intent::PaymentIntent};

/// Parameters for a single payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub receipt_email: Option<String>,
    pub payment_method_types: Vec<String>,
    /// When present the intent is confirmed in the same call.
    pub payment_method_id: Option<String>,
}

/// Payment processor operations used by checkout.
///
/// Implementations surface the processor's own state machine without
/// interpretation; declines and API errors map to `AppError::Payment`.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(&self, params: &CreatePaymentIntent) -> AppResult<PaymentIntent>;

    async fn confirm_payment_intent(
        &self,
        payment_intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> AppResult<PaymentIntent>;
}
