use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    application::use_cases::{
        campaign::CampaignUseCases, checkout::CheckoutUseCases, queue_processor::QueueProcessor,
        waitlist::WaitlistUseCases,
    },
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub waitlist: Arc<WaitlistUseCases>,
    pub campaigns: Arc<CampaignUseCases>,
    pub queue_processor: Arc<QueueProcessor>,
    pub checkout: Arc<CheckoutUseCases>,
}

impl FromRef<AppState> for Arc<WaitlistUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.waitlist.clone()
    }
}

impl FromRef<AppState> for Arc<CheckoutUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.checkout.clone()
    }
}
