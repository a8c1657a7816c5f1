//! Base trait shared by every agent session.

use async_trait::async_trait;

use crate::error::AgentResult;

/// A live, stateful connection to an external agent.
///
/// Sessions are single-threaded from the pipeline's point of view: every call
/// takes `&mut self` and the pipeline never issues two calls at once.
#[async_trait]
pub trait AgentSession: Send {
    /// Release the underlying resource (close the browser, drop the connection).
    ///
    /// Called exactly once per session by [`JobContext`](crate::pipeline::JobContext).
    async fn release(&mut self) -> AgentResult<()>;
}
