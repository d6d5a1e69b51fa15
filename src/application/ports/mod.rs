pub mod email_provider;
pub mod email_queue;
pub mod payment_provider;
