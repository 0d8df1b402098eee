//! Conversation domain: chat messages and the per-turn state machine

pub mod entities;
pub mod turn;

pub use entities::{Message, Role};
pub use turn::{TurnState, TurnTrace};
