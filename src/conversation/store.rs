//! In-memory conversation store.
//!
//! The store keeps an ordered, append-only list of (pattern, response) pairs.
//! Readers get a snapshot (`Arc` clone) so a scan in progress never observes
//! a concurrent append.

use std::sync::Arc;

use tokio::sync::RwLock;

/// Default pairs loaded into every new store, in priority order.
const DEFAULT_CONVERSATIONS: &[(&str, &str)] = &[
    ("Hi there!", "Hello! How can I help you today?"),
    (
        "Do you believe in God?",
        "As an AI, I don't have personal beliefs. This is a complex topic with many perspectives.",
    ),
    (
        "Tell me about your character",
        "As an AI assistant, I'm designed to be helpful, ethical, and informative.",
    ),
    (
        "What are your favourite things?",
        "As an AI, I don't have personal preferences, but I can discuss various topics!",
    ),
    (
        "I'm feeling sad today.",
        "I'm sorry to hear that. It's normal to feel sad sometimes. Would you like to talk about it?",
    ),
    (
        "How do you usually approach challenges?",
        "I approach challenges by analyzing the situation, considering multiple perspectives, and suggesting potential solutions.",
    ),
    (
        "Do you ever think about life and its meaning?",
        "As an AI, I don't contemplate existence, but I can discuss philosophical topics about life and meaning.",
    ),
    (
        "How do you feel about helping others?",
        "As an AI assistant, my primary function is to help and provide information to the best of my abilities.",
    ),
    (
        "What are your goals in life?",
        "As an AI, I don't have personal goals, but I'm designed to assist users in achieving their goals and finding information.",
    ),
];

/// A known user utterance and the reply associated with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationPair {
    /// Reference utterance matched against incoming messages.
    pub pattern: String,
    /// Reply returned when the pattern matches.
    pub response: String,
}

impl ConversationPair {
    /// Create a new pair.
    #[must_use]
    pub fn new(pattern: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            response: response.into(),
        }
    }
}

/// Immutable view of the store at the time of a scan.
pub type ConversationSnapshot = Arc<Vec<ConversationPair>>;

/// Append-only, insertion-ordered list of conversation pairs.
#[derive(Debug, Default)]
pub struct ConversationStore {
    pairs: RwLock<ConversationSnapshot>,
}

impl ConversationStore {
    /// Create a store holding the default greeting set.
    #[must_use]
    pub fn seed() -> Self {
        Self::from_pairs(
            DEFAULT_CONVERSATIONS
                .iter()
                .map(|(pattern, response)| ConversationPair::new(*pattern, *response)),
        )
    }

    /// Create a store from an ordered list of pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = ConversationPair>) -> Self {
        Self {
            pairs: RwLock::new(Arc::new(pairs.into_iter().collect())),
        }
    }

    /// Append a pair after every existing entry.
    ///
    /// Snapshots already handed out by [`Self::scan`] are left untouched.
    pub async fn append(&self, pattern: impl Into<String>, response: impl Into<String>) {
        let pair = ConversationPair::new(pattern, response);
        let mut guard = self.pairs.write().await;
        Arc::make_mut(&mut *guard).push(pair);
    }

    /// Snapshot of all pairs in insertion order.
    pub async fn scan(&self) -> ConversationSnapshot {
        Arc::clone(&*self.pairs.read().await)
    }

    /// Number of stored pairs.
    pub async fn len(&self) -> usize {
        self.pairs.read().await.len()
    }

    /// Whether the store holds no pairs.
    pub async fn is_empty(&self) -> bool {
        self.pairs.read().await.is_empty()
    }
}
