//! Shared building blocks for smsline: the `Message` record, configuration
//! loading and the common error type.

pub mod config;
pub mod error;
pub mod types;

pub use error::{Result, SmslineError};
pub use types::{ConnId, Message};
