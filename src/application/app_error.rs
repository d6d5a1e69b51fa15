use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Email delivery error: {0}")]
    Email(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Payments are not enabled")]
    PaymentsDisabled,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    StorageError,
    EmailError,
    NotConfigured,
    InvalidCredentials,
    InvalidInput,
    NotFound,
    PaymentError,
    PaymentsDisabled,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::EmailError => "EMAIL_ERROR",
            ErrorCode::NotConfigured => "NOT_CONFIGURED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PaymentError => "PAYMENT_ERROR",
            ErrorCode::PaymentsDisabled => "PAYMENTS_DISABLED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
