use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        email::{klaviyo::KlaviyoClient, relay::RelayEmailProvider, smtp::SmtpEmailProvider},
        http::app_state::AppState,
        persistence::{csv_file::LocalCsvStore, github::GitHubCsvStore, mongo::MongoWaitlistStore},
        queue::FileEmailQueue,
    },
    application::{
        email_templates::EmailTemplates,
        ports::{
            email_provider::{AudienceSync, EmailProvider},
            payment_provider::PaymentProvider,
        },
        use_cases::{
            campaign::CampaignUseCases, checkout::CheckoutUseCases, delivery::EmailDelivery,
            queue_processor::QueueProcessor,
            waitlist::{WaitlistRepo, WaitlistUseCases},
        },
    },
    infra::{
        config::{AppConfig, WaitlistBackend},
        error::InfraError,
        http_client,
        stripe_client::StripeClient,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;
    let client = http_client::try_build_client().map_err(InfraError::HttpClient)?;

    let local_csv = Arc::new(LocalCsvStore::new(config.csv_path.clone()));
    let (store, backup): (Arc<dyn WaitlistRepo>, Option<Arc<dyn WaitlistRepo>>) =
        match config.backend {
            WaitlistBackend::Csv => (local_csv, None),
            WaitlistBackend::Github => {
                let github = config
                    .github
                    .as_ref()
                    .ok_or(InfraError::ConfigMissing { var: "GITHUB_TOKEN" })?;
                let store = GitHubCsvStore::new(
                    client.clone(),
                    &github.api_base,
                    github.token.clone(),
                    github.file.clone(),
                );
                (Arc::new(store), Some(local_csv))
            }
            WaitlistBackend::Mongo => {
                let mongo = config
                    .mongo
                    .as_ref()
                    .ok_or(InfraError::ConfigMissing { var: "MONGODB_URI" })?;
                let store =
                    MongoWaitlistStore::connect(&mongo.uri, &mongo.database, &mongo.collection)
                        .await
                        .map_err(InfraError::StoreInit)?;
                (Arc::new(store), Some(local_csv))
            }
        };

    let mut providers: Vec<Arc<dyn EmailProvider>> = Vec::new();
    let mut audience: Option<Arc<dyn AudienceSync>> = None;
    if let Some(klaviyo) = &config.klaviyo {
        let klaviyo = Arc::new(KlaviyoClient::new(client.clone(), klaviyo.clone()));
        if klaviyo.has_list() {
            audience = Some(klaviyo.clone());
        }
        providers.push(klaviyo);
    }
    if let Some(relay) = &config.relay {
        providers.push(Arc::new(RelayEmailProvider::new(client.clone(), relay.clone())));
    }
    if let Some(smtp) = &config.smtp {
        providers.push(Arc::new(
            SmtpEmailProvider::new(smtp).map_err(InfraError::EmailInit)?,
        ));
    }
    if providers.is_empty() {
        tracing::warn!("No email provider configured, all mail will be queued");
    }

    let queue = Arc::new(FileEmailQueue::new(config.queue_root.clone()));
    let templates = EmailTemplates::new(
        config.template_dir.clone(),
        &config.brand_name,
        &config.order_url,
    );
    let delivery = Arc::new(EmailDelivery::new(providers, queue.clone(), templates));

    let waitlist = WaitlistUseCases::new(store, backup, audience, delivery.clone(), queue.clone());
    let campaigns =
        CampaignUseCases::new(waitlist.clone(), delivery.clone(), config.campaign_send_delay);
    let queue_processor = QueueProcessor::new(queue, delivery.clone());

    let payments = config.stripe.secret_key.clone().map(|key| {
        Arc::new(StripeClient::new(client.clone(), &config.stripe.api_base, key))
            as Arc<dyn PaymentProvider>
    });
    let payments_enabled = payments.is_some();
    let checkout = CheckoutUseCases::new(config.checkout.clone(), payments);

    tracing::info!(
        backend = %config.backend,
        providers = ?delivery.provider_names(),
        payments_enabled,
        "App state initialized"
    );

    Ok(AppState {
        config: Arc::new(config),
        waitlist: Arc::new(waitlist),
        campaigns: Arc::new(campaigns),
        queue_processor: Arc::new(queue_processor),
        checkout: Arc::new(checkout),
    })
}

/// Opens the JSON log for appending so a second process never truncates it.
fn open_log_file(path: &Path) -> Result<File, InfraError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(InfraError::LogFile)
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "waitlist_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let json_layer = match open_log_file(Path::new("app.log")) {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("{e}; continuing with console logging only");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
