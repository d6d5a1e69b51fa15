//! Test utilities for unit and HTTP-level testing.
//!
//! This module provides:
//! - In-memory implementations of the storage, queue and provider ports
//! - A builder for `AppState` wired entirely to those mocks

mod app_state_builder;
mod email_mocks;
mod payment_mocks;
mod storage_mocks;

pub use app_state_builder::*;
pub use email_mocks::*;
pub use payment_mocks::*;
pub use storage_mocks::*;
