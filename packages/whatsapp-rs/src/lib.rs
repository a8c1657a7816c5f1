// Client for a whatsapp-web HTTP bridge (wwebjs-api compatible).
//
// The bridge owns the browser-backed WhatsApp session and its on-disk auth
// store; this crate only talks to it over HTTP.

pub mod models;

use reqwest::{header, Client, StatusCode};
use thiserror::Error;

use crate::models::{
    IsRegisteredRequest, IsRegisteredResponse, SendMessageRequest, SendMessageResponse,
    SessionState, SessionStatusResponse,
};

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("request to WhatsApp bridge failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("WhatsApp bridge returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("WhatsApp bridge rejected the call: {0}")]
    Rejected(String),

    #[error("invalid API key header value")]
    InvalidApiKey,
}

pub type Result<T> = std::result::Result<T, WhatsAppError>;

#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    pub base_url: String,
    pub session_id: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WhatsAppService {
    options: WhatsAppOptions,
    client: Client,
}

/// Format a digits-only number as a WhatsApp user chat id.
pub fn chat_id(number: &str) -> String {
    format!("{}@c.us", number)
}

impl WhatsAppService {
    pub fn new(options: WhatsAppOptions) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = &options.api_key {
            headers.insert(
                "x-api-key",
                key.parse().map_err(|_| WhatsAppError::InvalidApiKey)?,
            );
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { options, client })
    }

    pub fn session_id(&self) -> &str {
        &self.options.session_id
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.options.base_url.trim_end_matches('/'),
            path,
            self.options.session_id
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Status { status, body });
        }
        Ok(response)
    }

    /// Current connection state of the configured session.
    pub async fn session_state(&self) -> Result<SessionState> {
        let response = self.client.get(self.url("session/status")).send().await?;
        let status: SessionStatusResponse = Self::check(response).await?.json().await?;

        if !status.success {
            return Ok(SessionState::Other(
                status.message.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        Ok(SessionState::from_wire(status.state.as_deref()))
    }

    /// Whether `number` (digits only) has a WhatsApp account.
    pub async fn is_registered_user(&self, number: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.url("client/isRegisteredUser"))
            .json(&IsRegisteredRequest { number })
            .send()
            .await?;
        let body: IsRegisteredResponse = Self::check(response).await?.json().await?;

        if !body.success {
            return Err(WhatsAppError::Rejected(format!(
                "registration lookup failed for {}",
                number
            )));
        }

        Ok(body.result)
    }

    /// Send a plain-text message to a chat id (`{digits}@c.us`).
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("client/sendMessage"))
            .json(&SendMessageRequest {
                chat_id,
                content_type: "string",
                content: text,
            })
            .send()
            .await?;
        let body: SendMessageResponse = Self::check(response).await?.json().await?;

        if !body.success {
            return Err(WhatsAppError::Rejected(
                body.error.unwrap_or_else(|| "send failed".to_string()),
            ));
        }

        Ok(())
    }
}
