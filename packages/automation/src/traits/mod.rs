//! Core trait abstractions.

pub mod agent;
pub mod browser;
pub mod messenger;

pub use agent::AgentSession;
pub use browser::{BrowserAgent, DetailFields, Probe, SearchSession};
pub use messenger::{Messenger, MessengerSession};
