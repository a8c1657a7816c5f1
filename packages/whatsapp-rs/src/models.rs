use serde::{Deserialize, Serialize};

/// Connection state reported by the bridge for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Authenticated and able to send.
    Connected,
    /// Waiting for the QR code to be scanned.
    PendingQr,
    /// Any other state string the bridge reports (e.g. `CONFLICT`, `UNPAIRED`).
    Other(String),
}

impl SessionState {
    pub fn from_wire(state: Option<&str>) -> Self {
        match state {
            Some("CONNECTED") => SessionState::Connected,
            Some("OPENING") | Some("PAIRING") | None => SessionState::PendingQr,
            Some(other) => SessionState::Other(other.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Connected)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionStatusResponse {
    pub success: bool,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IsRegisteredRequest<'a> {
    pub number: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IsRegisteredResponse {
    pub success: bool,
    #[serde(default)]
    pub result: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub content_type: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_from_wire() {
        assert_eq!(SessionState::from_wire(Some("CONNECTED")), SessionState::Connected);
        assert_eq!(SessionState::from_wire(None), SessionState::PendingQr);
        assert_eq!(
            SessionState::from_wire(Some("UNPAIRED")),
            SessionState::Other("UNPAIRED".to_string())
        );
        assert!(SessionState::Connected.is_ready());
        assert!(!SessionState::PendingQr.is_ready());
    }

    #[test]
    fn test_send_message_request_is_camel_case() {
        let body = SendMessageRequest {
            chat_id: "5511999999999@c.us",
            content_type: "string",
            content: "Olá",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chatId"], "5511999999999@c.us");
        assert_eq!(json["contentType"], "string");
    }

    #[test]
    fn test_status_response_tolerates_missing_fields() {
        let status: SessionStatusResponse =
            serde_json::from_str(r#"{"success": false, "message": "session_not_found"}"#).unwrap();
        assert!(!status.success);
        assert!(status.state.is_none());
    }
}
