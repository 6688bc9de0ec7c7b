//! Streaming protocol support
//!
//! - Event-stream frame parsing for the task + SSE protocol
//! - The streaming session controller
//! - The superseded raw-text sentinel protocol, kept behind a capability
//!   flag on its own code path

mod sentinel;
mod session;
mod sse;


pub use sentinel::*;
pub use session::*;
pub use sse::*;
