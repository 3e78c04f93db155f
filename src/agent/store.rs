//! Conversation store - where runs read prior context and persist results
//!
//! The executor itself never touches storage; callers load a conversation,
//! run the agent, and save the updated transcript and cost. The in-memory
//! implementation backs the REPL and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{CostRecord, Result};

/// A message in a stored conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Role of the sender (user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl StoredMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A stored conversation with its accumulated cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation identifier, unique per user
    pub id: String,
    /// Message history in order
    pub messages: Vec<StoredMessage>,
    /// Total cost across all runs of this conversation
    pub cost: CostRecord,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            cost: CostRecord::default(),
        }
    }

    /// Append a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.messages.push(StoredMessage::user(content));
    }

    /// Append an assistant message
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(StoredMessage::assistant(content));
    }

    /// Fold a run's cost into the conversation total
    pub fn add_cost(&mut self, cost: &CostRecord) {
        self.cost.add(cost);
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last N messages
    pub fn last_n(&self, n: usize) -> &[StoredMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }
}

/// Where conversations live between runs
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Find a conversation by user and id
    async fn find(&self, user: &str, id: &str) -> Result<Option<Conversation>>;

    /// Save a conversation under a user
    async fn save(&self, user: &str, conversation: &Conversation) -> Result<()>;

    /// Delete a conversation
    async fn delete(&self, user: &str, id: &str) -> Result<()>;
}

/// In-memory conversation store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<(String, String), Conversation>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find(&self, user: &str, id: &str) -> Result<Option<Conversation>> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map.get(&(user.to_string(), id.to_string())).cloned())
    }

    async fn save(&self, user: &str, conversation: &Conversation) -> Result<()> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(
            (user.to_string(), conversation.id.clone()),
            conversation.clone(),
        );
        Ok(())
    }

    async fn delete(&self, user: &str, id: &str) -> Result<()> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&(user.to_string(), id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();

        let mut conversation = Conversation::new("chat-1");
        conversation.add_user("Hello");
        conversation.add_assistant("Hi there!");
        conversation.add_cost(&CostRecord {
            input_tokens: 10,
            output_tokens: 5,
            price: 0.01,
        });

        store.save("alex", &conversation).await.unwrap();

        let found = store.find("alex", "chat-1").await.unwrap().unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.cost.input_tokens, 10);

        // Other users don't see it
        assert!(store.find("sam", "chat-1").await.unwrap().is_none());

        store.delete("alex", "chat-1").await.unwrap();
        assert!(store.find("alex", "chat-1").await.unwrap().is_none());
    }

    #[test]
    fn test_last_n() {
        let mut conversation = Conversation::new("chat-1");
        conversation.add_user("1");
        conversation.add_assistant("2");
        conversation.add_user("3");

        let last = conversation.last_n(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].content, "2");

        assert_eq!(conversation.last_n(10).len(), 3);
    }
}
