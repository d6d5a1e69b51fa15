//! Payment provider stub.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{CreatePaymentIntent, PaymentProvider},
    domain::entities::payment_intent::PaymentIntent,
};

/// Returns a fixed intent (or error) and records create calls.
pub struct StubPaymentProvider {
    response: Result<PaymentIntent, String>,
    created: Mutex<Vec<CreatePaymentIntent>>,
    confirmed: Mutex<Vec<(String, Option<String>)>>,
}

impl StubPaymentProvider {
    pub fn returning(intent: PaymentIntent) -> Self {
        Self {
            response: Ok(intent),
            created: Mutex::new(Vec::new()),
            confirmed: Mutex::new(Vec::new()),
        }
    }

    pub fn declining(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            created: Mutex::new(Vec::new()),
            confirmed: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<CreatePaymentIntent> {
        self.created.lock().unwrap().clone()
    }

    pub fn confirmed(&self) -> Vec<(String, Option<String>)> {
        self.confirmed.lock().unwrap().clone()
    }

    fn respond(&self) -> AppResult<PaymentIntent> {
        self.response.clone().map_err(AppError::Payment)
    }
}

#[async_trait]
impl PaymentProvider for StubPaymentProvider {
    async fn create_payment_intent(&self, params: &CreatePaymentIntent) -> AppResult<PaymentIntent> {
        self.created.lock().unwrap().push(params.clone());
        self.respond()
    }

    async fn confirm_payment_intent(
        &self,
        payment_intent_id: &str,
        payment_method_id: Option<&str>,
    ) -> AppResult<PaymentIntent> {
        self.confirmed.lock().unwrap().push((
            payment_intent_id.to_string(),
            payment_method_id.map(str::to_string),
        ));
        self.respond()
    }
}
