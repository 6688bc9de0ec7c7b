//! Typed backend API surface
//!
//! Wire shapes and endpoint calls for the chat task protocol and the
//! conversation history endpoints.

mod chat;
mod conversations;
mod types;

pub use chat::*;
pub use conversations::*;
pub use types::*;
