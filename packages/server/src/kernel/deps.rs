//! Server dependencies and the adapters that bind vendor clients to the
//! pipeline's capability traits.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use whatsapp::WhatsAppService;

use automation::{
    AgentError, AgentResult, AgentSession, BrowserAgent, ExportSink, Messenger, MessengerSession,
    MessagingPipeline, MessagingSettings, ScrapePipeline, ScrapeSettings,
};

// =============================================================================
// WhatsApp Adapter
// =============================================================================

/// Adapter that implements [`Messenger`] over the WhatsApp bridge client.
pub struct WhatsAppAdapter(pub Arc<WhatsAppService>);

impl WhatsAppAdapter {
    pub fn new(service: Arc<WhatsAppService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl Messenger for WhatsAppAdapter {
    async fn connect(&self) -> AgentResult<Box<dyn MessengerSession>> {
        let state = self
            .0
            .session_state()
            .await
            .map_err(|e| AgentError::Unavailable(e.to_string()))?;

        if !state.is_ready() {
            return Err(AgentError::Unavailable(format!(
                "WhatsApp session {} is not ready ({:?})",
                self.0.session_id(),
                state
            )));
        }

        info!(session = %self.0.session_id(), "WhatsApp session ready");
        Ok(Box::new(WhatsAppSession(self.0.clone())))
    }
}

/// A ready bridge session. The bridge keeps the connection alive across Jobs.
pub struct WhatsAppSession(Arc<WhatsAppService>);

#[async_trait]
impl AgentSession for WhatsAppSession {
    async fn release(&mut self) -> AgentResult<()> {
        debug!(session = %self.0.session_id(), "WhatsApp session handed back to bridge");
        Ok(())
    }
}

#[async_trait]
impl MessengerSession for WhatsAppSession {
    async fn is_registered(&mut self, number: &str) -> AgentResult<bool> {
        self.0
            .is_registered_user(number)
            .await
            .map_err(AgentError::interaction)
    }

    async fn send_message(&mut self, number: &str, text: &str) -> AgentResult<()> {
        self.0
            .send_message(&whatsapp::chat_id(number), text)
            .await
            .map_err(AgentError::interaction)
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to handlers (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub browser: Arc<dyn BrowserAgent>,
    pub messenger: Arc<dyn Messenger>,
    pub exporter: Arc<dyn ExportSink>,
    pub scrape_settings: ScrapeSettings,
    pub messaging_settings: MessagingSettings,
}

impl ServerDeps {
    pub fn new(
        browser: Arc<dyn BrowserAgent>,
        messenger: Arc<dyn Messenger>,
        exporter: Arc<dyn ExportSink>,
        scrape_settings: ScrapeSettings,
        messaging_settings: MessagingSettings,
    ) -> Self {
        Self {
            browser,
            messenger,
            exporter,
            scrape_settings,
            messaging_settings,
        }
    }

    pub fn scrape_pipeline(&self) -> ScrapePipeline {
        ScrapePipeline::new(
            self.browser.clone(),
            self.exporter.clone(),
            self.scrape_settings.clone(),
        )
    }

    pub fn messaging_pipeline(&self) -> MessagingPipeline {
        MessagingPipeline::new(self.messenger.clone(), self.messaging_settings.clone())
    }
}
