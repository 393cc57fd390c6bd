// Conversation engine: turns, per-session memory, prompt assembly and the HTTP surface.
// All model calls go through llm_client::ChatModel, never reqwest directly.

pub mod assembler;
pub mod handlers;
pub mod memory;
pub mod prompts;
pub mod session;
pub mod store;
pub mod turn;

pub use turn::{Role, Turn};
