//! HTTP side of smsline: the SMS webhook receiver, the per-client event
//! stream, and the health probe, all sharing one injected [`MessageStore`].
//!
//! [`MessageStore`]: smsline_store::MessageStore

pub mod app;
pub mod http;
pub mod sse;
