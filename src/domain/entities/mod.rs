pub mod campaign;
pub mod payment_intent;
pub mod queued_email;
pub mod subscriber;
