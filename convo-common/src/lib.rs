//! Conversation Gateway Common Types
//!
//! Shared types used by both the gateway and the load harness.

pub mod conversation;
pub mod forward;

pub use conversation::{ConversationRequest, Metadata};
pub use forward::{ForwardInputs, ForwardPayload, PredictionResponse};
