pub mod app;
pub mod config;
pub mod error;
pub mod http_client;
pub mod setup;
pub mod stripe_client;
