//! Pulse - streaming chat client for the ComplainSG civic feedback service
//!
//! This crate implements the browser-facing protocol of the PulseSG backend
//! as a typed Rust client: a two-phase streaming chat exchange (create a
//! task, subscribe to its server-sent event stream), a conversation state
//! store for UI consumption, and a thin REST surface for conversation
//! history.

pub mod api;
pub mod client;
pub mod config;
pub mod conversation;
pub mod credentials;
pub mod error;
pub mod network;
pub mod streaming;

pub use client::PulseClient;
pub use config::ClientConfig;
pub use conversation::{ConversationStore, ConversationTurn};
pub use credentials::{Anonymous, CredentialsProvider, StaticToken};
pub use error::ClientError;
pub use streaming::{
    ChatSession, SessionCallbacks, SessionOptions, SessionResult, SessionStatus, StreamEvent,
};
