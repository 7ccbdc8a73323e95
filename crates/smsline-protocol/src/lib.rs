//! Wire formats spoken by smsline: the server-sent event stream and the
//! TwiML acknowledgement returned to the SMS provider.

pub mod frames;
pub mod twiml;

pub use frames::{SseFrame, StreamEvent};
