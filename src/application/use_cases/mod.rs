pub mod campaign;
pub mod checkout;
pub mod delivery;
pub mod queue_processor;
pub mod waitlist;
