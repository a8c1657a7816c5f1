//! Capability interface for a messaging agent.

use async_trait::async_trait;

use super::agent::AgentSession;
use crate::error::AgentResult;

/// Connects to a messaging client.
///
/// `connect` consumes the client's lifecycle signals once (ready, auth
/// failure, disconnected) and only returns a session when the client is ready.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn connect(&self) -> AgentResult<Box<dyn MessengerSession>>;
}

#[async_trait]
pub trait MessengerSession: AgentSession {
    /// Whether the digits-only `number` can receive messages.
    async fn is_registered(&mut self, number: &str) -> AgentResult<bool>;

    /// Deliver `text` to the digits-only `number`.
    async fn send_message(&mut self, number: &str, text: &str) -> AgentResult<()>;
}
