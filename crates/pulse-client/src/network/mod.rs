//! Network layer
//!
//! Request transport plus timeout and cancellation helpers.

mod timeout;
mod transport;

pub use timeout::*;
pub use transport::*;
