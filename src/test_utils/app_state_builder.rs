//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires a complete `AppState` to in-memory mocks and
//! hands the mocks back so tests can inspect side effects.

use std::{collections::BTreeMap, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::http::HeaderValue;
use secrecy::SecretString;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        email_templates::EmailTemplates,
        ports::{email_provider::EmailProvider, payment_provider::PaymentProvider},
        use_cases::{
            campaign::CampaignUseCases,
            checkout::{CheckoutConfig, CheckoutUseCases},
            delivery::EmailDelivery,
            queue_processor::QueueProcessor,
            waitlist::WaitlistUseCases,
        },
    },
    domain::entities::{campaign::Campaign, queued_email::QueuedEmail},
    infra::{
        config::{AdminCredentials, AppConfig, StripeSettings, WaitlistBackend},
        stripe_client::STRIPE_API_BASE,
    },
    test_utils::{
        FailingEmailProvider, InMemoryEmailQueue, InMemoryWaitlistRepo, RecordingEmailProvider,
    },
};

pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "correct-horse";

/// Built state plus handles to the mocks behind it.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryWaitlistRepo>,
    pub queue: Arc<InMemoryEmailQueue>,
    pub emails: Arc<RecordingEmailProvider>,
}

pub struct TestAppStateBuilder {
    store: Arc<InMemoryWaitlistRepo>,
    queue: Arc<InMemoryEmailQueue>,
    emails: Arc<RecordingEmailProvider>,
    failing_email: bool,
    payment_provider: Option<Arc<dyn PaymentProvider>>,
    admin: bool,
    webhook_secret: Option<String>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryWaitlistRepo::new()),
            queue: Arc::new(InMemoryEmailQueue::new()),
            emails: Arc::new(RecordingEmailProvider::new("recording")),
            failing_email: false,
            payment_provider: None,
            admin: true,
            webhook_secret: None,
        }
    }

    pub fn with_subscriber(self, email: &str) -> Self {
        self.store.seed(email);
        self
    }

    pub fn with_queued(self, to: &str) -> Self {
        self.queue.push(QueuedEmail::new(
            to,
            "Queued",
            "<p>queued</p>",
            Campaign::Update,
            BTreeMap::new(),
        ));
        self
    }

    /// Every email provider fails, so mail ends up in the queue.
    pub fn with_failing_email(mut self) -> Self {
        self.failing_email = true;
        self
    }

    /// Store writes fail and there is no backup.
    pub fn with_failing_store(self) -> Self {
        self.store.fail_writes();
        self
    }

    pub fn with_payment_provider(mut self, provider: Arc<dyn PaymentProvider>) -> Self {
        self.payment_provider = Some(provider);
        self
    }

    pub fn without_admin(mut self) -> Self {
        self.admin = false;
        self
    }

    pub fn with_webhook_secret(mut self, secret: &str) -> Self {
        self.webhook_secret = Some(secret.to_string());
        self
    }

    pub fn build(self) -> TestApp {
        let config = test_config(self.admin, self.webhook_secret);

        let provider: Arc<dyn EmailProvider> = if self.failing_email {
            Arc::new(FailingEmailProvider::new("failing"))
        } else {
            self.emails.clone()
        };
        let templates = EmailTemplates::new(
            config.template_dir.clone(),
            &config.brand_name,
            &config.order_url,
        );
        let delivery = Arc::new(EmailDelivery::new(
            vec![provider],
            self.queue.clone(),
            templates,
        ));

        let waitlist = WaitlistUseCases::new(
            self.store.clone(),
            None,
            None,
            delivery.clone(),
            self.queue.clone(),
        );
        let campaigns =
            CampaignUseCases::new(waitlist.clone(), delivery.clone(), config.campaign_send_delay);
        let queue_processor = QueueProcessor::new(self.queue.clone(), delivery);
        let checkout = CheckoutUseCases::new(config.checkout.clone(), self.payment_provider);

        TestApp {
            state: AppState {
                config: Arc::new(config),
                waitlist: Arc::new(waitlist),
                campaigns: Arc::new(campaigns),
                queue_processor: Arc::new(queue_processor),
                checkout: Arc::new(checkout),
            },
            store: self.store,
            queue: self.queue,
            emails: self.emails,
        }
    }
}

fn test_config(admin: bool, webhook_secret: Option<String>) -> AppConfig {
    AppConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        backend: WaitlistBackend::Csv,
        csv_path: PathBuf::from("unused.csv"),
        github: None,
        mongo: None,
        queue_root: PathBuf::from("unused-queue"),
        template_dir: std::env::temp_dir().join("waitlist-api-missing-templates"),
        brand_name: "Itza".to_string(),
        order_url: "https://shop.example/order".to_string(),
        campaign_send_delay: Duration::ZERO,
        klaviyo: None,
        relay: None,
        smtp: None,
        admin: admin.then(|| AdminCredentials {
            username: TEST_ADMIN_USERNAME.to_string(),
            password: SecretString::new(TEST_ADMIN_PASSWORD.into()),
        }),
        stripe: StripeSettings {
            api_base: STRIPE_API_BASE.to_string(),
            secret_key: None,
            webhook_secret: webhook_secret.map(|s| SecretString::new(s.into())),
        },
        checkout: CheckoutConfig {
            publishable_key: "pk_test_123".to_string(),
            product_name: "Itza Yerba Mate".to_string(),
            unit_amount: 2500,
            currency: "usd".to_string(),
            payment_method_types: vec!["card".to_string()],
        },
    }
}
