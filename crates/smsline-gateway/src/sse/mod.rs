//! Per-connection event stream: the session state machine and the sink it
//! writes frames into.

pub mod error;
pub mod session;
pub mod sink;

pub use error::StreamError;
pub use session::{CloseReason, SessionReport, StreamSession};
pub use sink::{ChannelSink, FrameSink};
