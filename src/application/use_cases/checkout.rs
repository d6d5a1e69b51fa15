use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::{CreatePaymentIntent, PaymentProvider},
        validators::parse_waitlist_email,
    },
    domain::entities::payment_intent::{PaymentIntent, PaymentIntentStatus},
};

pub const MAX_QUANTITY: u32 = 100;

/// Accepts only `pi_` followed by ASCII alphanumerics or underscores.
fn is_payment_intent_id(id: &str) -> bool {
    id.strip_prefix("pi_").is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Product and processor settings exposed to the checkout page.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutConfig {
    pub publishable_key: String,
    pub product_name: String,
    pub unit_amount: i64,
    pub currency: String,
    #[serde(skip)]
    pub payment_method_types: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreatePaymentRequest {
    pub email: Option<String>,
    pub quantity: Option<u32>,
    pub payment_method_id: Option<String>,
}

/// How a payment intent state is reported back to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PaymentResult {
    Succeeded {
        success: bool,
        payment_intent_id: String,
    },
    RequiresAction {
        requires_action: bool,
        client_secret: String,
        payment_intent_id: String,
    },
    Pending {
        status: String,
        client_secret: Option<String>,
        payment_intent_id: String,
    },
}

impl PaymentResult {
    fn from_intent(intent: PaymentIntent) -> AppResult<Self> {
        match intent.status {
            PaymentIntentStatus::Succeeded => Ok(PaymentResult::Succeeded {
                success: true,
                payment_intent_id: intent.id,
            }),
            PaymentIntentStatus::RequiresAction => {
                let client_secret = intent.client_secret.ok_or_else(|| {
                    AppError::Payment("Payment requires action but no client secret was returned".into())
                })?;
                Ok(PaymentResult::RequiresAction {
                    requires_action: true,
                    client_secret,
                    payment_intent_id: intent.id,
                })
            }
            PaymentIntentStatus::RequiresPaymentMethod if intent.last_error.is_some() => {
                Err(AppError::Payment(intent.last_error.unwrap_or_default()))
            }
            status => Ok(PaymentResult::Pending {
                status: status.to_string(),
                client_secret: intent.client_secret,
                payment_intent_id: intent.id,
            }),
        }
    }
}

/// Checkout operations. Without a configured processor every payment call
/// returns `PaymentsDisabled`.
#[derive(Clone)]
pub struct CheckoutUseCases {
    config: CheckoutConfig,
    provider: Option<Arc<dyn PaymentProvider>>,
}

impl CheckoutUseCases {
    pub fn new(config: CheckoutConfig, provider: Option<Arc<dyn PaymentProvider>>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn payment_method_types(&self) -> &[String] {
        &self.config.payment_method_types
    }

    fn provider(&self) -> AppResult<&Arc<dyn PaymentProvider>> {
        self.provider.as_ref().ok_or(AppError::PaymentsDisabled)
    }

    #[instrument(skip(self))]
    pub async fn create_payment(&self, request: &CreatePaymentRequest) -> AppResult<PaymentResult> {
        let provider = self.provider()?;

        let quantity = request.quantity.unwrap_or(1);
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(AppError::InvalidInput(format!(
                "Quantity must be between 1 and {MAX_QUANTITY}"
            )));
        }

        let receipt_email = match request.email.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_waitlist_email(Some(raw))?),
            _ => None,
        };

        let params = CreatePaymentIntent {
            amount: self.config.unit_amount * i64::from(quantity),
            currency: self.config.currency.clone(),
            description: format!("{} x{quantity}", self.config.product_name),
            receipt_email,
            payment_method_types: self.config.payment_method_types.clone(),
            payment_method_id: request.payment_method_id.clone(),
        };

        let intent = provider.create_payment_intent(&params).await?;
        tracing::info!(
            payment_intent_id = %intent.id,
            status = %intent.status,
            amount = intent.amount,
            "Payment intent created"
        );
        PaymentResult::from_intent(intent)
    }

    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        payment_intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> AppResult<PaymentResult> {
        let provider = self.provider()?;
        if payment_intent_id.trim().is_empty() {
            return Err(AppError::InvalidInput("payment_intent_id is required".into()));
        }
        if !is_payment_intent_id(payment_intent_id) {
            return Err(AppError::InvalidInput("Invalid payment_intent_id".into()));
        }

        let intent = provider
            .confirm_payment_intent(payment_intent_id, payment_method_id)
            .await?;
        tracing::info!(payment_intent_id = %intent.id, status = %intent.status, "Payment intent confirmed");
        PaymentResult::from_intent(intent)
    }
}
