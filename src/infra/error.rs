use thiserror::Error;

use crate::app_error::AppError;

/// Infrastructure errors that can occur during startup.
///
/// Display messages never include secret values; use `%e` in logs.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Configuration error: environment variable {var} not set")]
    ConfigMissing { var: &'static str },

    #[error("Configuration error: {var} is invalid: {reason}")]
    ConfigInvalid { var: &'static str, reason: String },

    #[error("Waitlist store initialization failed")]
    StoreInit(#[source] AppError),

    #[error("Email provider initialization failed")]
    EmailInit(#[source] AppError),

    #[error("HTTP client initialization failed")]
    HttpClient(#[source] reqwest::Error),

    #[error("Log file could not be created")]
    LogFile(#[source] std::io::Error),

    #[error("TCP bind failed")]
    TcpBind(#[source] std::io::Error),

    #[error("Server error")]
    Server(#[source] std::io::Error),
}
