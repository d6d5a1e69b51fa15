use std::{collections::HashMap, net::SocketAddr, path::PathBuf, time::Duration};

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;
use strum::{Display, EnumString, IntoEnumIterator};

use crate::{
    adapters::{
        email::{
            klaviyo::{KLAVIYO_API_BASE, KlaviyoConfig},
            relay::{RELAY_ENDPOINT, RelayConfig},
            smtp::SmtpConfig,
        },
        persistence::github::{GITHUB_API_BASE, GitHubFile},
    },
    application::use_cases::checkout::CheckoutConfig,
    domain::entities::campaign::Campaign,
    infra::{error::InfraError, stripe_client::STRIPE_API_BASE},
};

/// Which store holds the authoritative waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WaitlistBackend {
    #[default]
    Csv,
    Github,
    Mongo,
}

#[derive(Clone)]
pub struct GitHubSettings {
    pub api_base: String,
    pub token: SecretString,
    pub file: GitHubFile,
}

#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Clone)]
pub struct StripeSettings {
    pub api_base: String,
    pub secret_key: Option<SecretString>,
    pub webhook_secret: Option<SecretString>,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub backend: WaitlistBackend,
    /// Local CSV: the primary store for `csv`, the backup otherwise.
    pub csv_path: PathBuf,
    pub github: Option<GitHubSettings>,
    pub mongo: Option<MongoSettings>,
    pub queue_root: PathBuf,
    pub template_dir: PathBuf,
    pub brand_name: String,
    pub order_url: String,
    pub campaign_send_delay: Duration,
    /// Providers are listed in chain order; `None` leaves one out.
    pub klaviyo: Option<KlaviyoConfig>,
    pub relay: Option<RelayConfig>,
    pub smtp: Option<SmtpConfig>,
    /// Admin routes reject every request when unset.
    pub admin: Option<AdminCredentials>,
    pub stripe: StripeSettings,
    pub checkout: CheckoutConfig,
}

/// Reads an optional variable; empty values count as unset.
fn optional_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn optional_secret(var: &str) -> Option<SecretString> {
    optional_env(var).map(|v| SecretString::new(v.into()))
}

fn required_env(var: &'static str) -> Result<String, InfraError> {
    optional_env(var).ok_or(InfraError::ConfigMissing { var })
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 5000)));
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|e: axum::http::header::InvalidHeaderValue| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                    reason: e.to_string(),
                })?;

        let backend: WaitlistBackend = match optional_env("WAITLIST_BACKEND") {
            Some(raw) => raw.parse().map_err(|_| InfraError::ConfigInvalid {
                var: "WAITLIST_BACKEND",
                reason: format!("expected csv, github or mongo, got {raw}"),
            })?,
            None => WaitlistBackend::default(),
        };

        let github = match backend {
            WaitlistBackend::Github => Some(GitHubSettings {
                api_base: get_env_default("GITHUB_API_BASE", GITHUB_API_BASE.to_string()),
                token: SecretString::new(required_env("GITHUB_TOKEN")?.into()),
                file: GitHubFile {
                    owner: required_env("GITHUB_REPO_OWNER")?,
                    repo: required_env("GITHUB_REPO_NAME")?,
                    path: get_env_default("GITHUB_FILE_PATH", "waitlist.csv".to_string()),
                },
            }),
            _ => None,
        };

        let mongo = match backend {
            WaitlistBackend::Mongo => Some(MongoSettings {
                uri: required_env("MONGODB_URI")?,
                database: get_env_default("MONGODB_DATABASE", "waitlist".to_string()),
                collection: get_env_default("MONGODB_COLLECTION", "subscribers".to_string()),
            }),
            _ => None,
        };

        let brand_name = get_env_default("BRAND_NAME", "Itza Yerba Mate".to_string());
        let sender_email = optional_env("SENDER_EMAIL");

        let klaviyo = optional_secret("KLAVIYO_API_KEY").map(|api_key| KlaviyoConfig {
            api_base: get_env_default("KLAVIYO_API_BASE", KLAVIYO_API_BASE.to_string()),
            api_key,
            from_email: sender_email
                .clone()
                .unwrap_or_else(|| "hello@drinkitza.com".to_string()),
            from_name: brand_name.clone(),
            list_id: optional_env("KLAVIYO_LIST_ID"),
            template_ids: klaviyo_template_ids(),
        });

        let relay = match (
            optional_env("EMAIL_SERVICE_ID"),
            optional_env("EMAIL_SERVICE_USER_ID"),
            optional_env("EMAIL_SERVICE_TEMPLATE_ID"),
        ) {
            (Some(service_id), Some(user_id), Some(template_id)) => Some(RelayConfig {
                endpoint: get_env_default("EMAIL_SERVICE_ENDPOINT", RELAY_ENDPOINT.to_string()),
                service_id,
                template_id,
                user_id,
                access_token: optional_secret("EMAIL_SERVICE_ACCESS_TOKEN"),
            }),
            _ => None,
        };

        let smtp = match (sender_email, optional_secret("SENDER_APP_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpConfig {
                host: get_env_default("SMTP_HOST", "smtp.gmail.com".to_string()),
                port: get_env_default("SMTP_PORT", 587),
                username,
                password,
                from_name: brand_name.clone(),
            }),
            _ => None,
        };

        let admin = match (optional_env("ADMIN_USERNAME"), optional_secret("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
            _ => None,
        };

        let stripe = StripeSettings {
            api_base: get_env_default("STRIPE_API_BASE", STRIPE_API_BASE.to_string()),
            secret_key: optional_secret("STRIPE_SECRET_KEY"),
            webhook_secret: optional_secret("STRIPE_WEBHOOK_SECRET"),
        };

        let checkout = CheckoutConfig {
            publishable_key: optional_env("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
            product_name: get_env_default("PRODUCT_NAME", brand_name.clone()),
            unit_amount: get_env_default("PRODUCT_PRICE_CENTS", 2500),
            currency: get_env_default("CURRENCY", "usd".to_string()).to_lowercase(),
            payment_method_types: parse_list(&get_env_default(
                "PAYMENT_METHOD_TYPES",
                "card".to_string(),
            )),
        };

        Ok(Self {
            bind_addr,
            cors_origin,
            backend,
            csv_path: get_env_default("WAITLIST_CSV_PATH", PathBuf::from("waitlist.csv")),
            github,
            mongo,
            queue_root: get_env_default("EMAIL_QUEUE_ROOT", PathBuf::from("email_queue")),
            template_dir: get_env_default("EMAIL_TEMPLATE_DIR", PathBuf::from("email_templates")),
            brand_name,
            order_url: get_env_default("ORDER_URL", String::new()),
            campaign_send_delay: Duration::from_millis(get_env_default(
                "CAMPAIGN_SEND_DELAY_MS",
                1000,
            )),
            klaviyo,
            relay,
            smtp,
            admin,
            stripe,
            checkout,
        })
    }
}

/// `KLAVIYO_<CAMPAIGN>_TEMPLATE_ID` for every campaign that has one.
fn klaviyo_template_ids() -> HashMap<Campaign, String> {
    Campaign::iter()
        .filter_map(|campaign| {
            let var = format!("KLAVIYO_{}_TEMPLATE_ID", campaign.as_ref().to_uppercase());
            optional_env(&var).map(|id| (campaign, id))
        })
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
