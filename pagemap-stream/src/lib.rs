pub mod client;
pub mod control;
pub mod error;
pub mod event;
pub mod reconnect;
pub mod sse;
pub mod status;

pub use client::{StreamClient, StreamHandle};
pub use control::SessionControl;
pub use error::{Result, StreamError};
pub use event::ProgressEvent;
pub use reconnect::{ConnectionState, RetryPolicy};
pub use status::{ActivityKind, SessionCommand, SessionState, SessionStatus};
