//! Known conversations and how incoming messages are answered from them.

pub mod resolver;
pub mod store;

pub use resolver::{FallbackPolicy, ResponseResolver, find_response};
pub use store::{ConversationPair, ConversationSnapshot, ConversationStore};
