pub mod klaviyo;
pub mod relay;
pub mod smtp;
