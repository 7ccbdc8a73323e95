//! Listener side of smsline: connects to the gateway's event stream, keeps
//! reconnecting with backoff, and turns new messages into timed toasts.

pub mod backoff;
pub mod decoder;
pub mod error;
pub mod format;
pub mod listener;
pub mod toast;
pub mod webhook;

pub use backoff::Backoff;
pub use error::ClientError;
pub use listener::{ListenerEvent, StreamListener};
pub use toast::{ToastChange, ToastTray};
