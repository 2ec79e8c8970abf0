//! Message envelope

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Message carries no data")]
    MissingData,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Action tag carried by every message
///
/// Kept as an open string so actions unknown to this gateway still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Client presents an encrypted credential
    pub const AUTHENTICATE: &'static str = "authenticate";

    /// Gateway reports an error to the client
    pub const NOTIFY_ERROR: &'static str = "notify.error";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn authenticate() -> Self {
        Self::new(Self::AUTHENTICATE)
    }

    pub fn notify_error() -> Self {
        Self::new(Self::NOTIFY_ERROR)
    }

    /// Check whether this action is the given tag
    pub fn is(&self, tag: &str) -> bool {
        self.0 == tag
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message envelope - the unit exchanged with a client connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sequence number assigned by the sender (0 for gateway notifications)
    #[serde(default)]
    pub seq: i64,

    /// Routing tag
    pub action: Action,

    /// Opaque payload, interpreted according to `action`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Message {
    /// Create a message with a serializable payload
    pub fn new(seq: i64, action: Action, data: impl Serialize) -> Result<Self, ProtocolError> {
        Ok(Self {
            seq,
            action,
            data: Some(serde_json::to_value(data)?),
        })
    }

    /// Create an error notification with a human-readable body
    pub fn notify_error(seq: i64, text: impl Into<String>) -> Self {
        Self {
            seq,
            action: Action::notify_error(),
            data: Some(serde_json::Value::String(text.into())),
        }
    }

    /// Deserialize the payload into a typed value
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let data = self.data.clone().ok_or(ProtocolError::MissingData)?;
        Ok(serde_json::from_value(data)?)
    }

    /// Encode to JSON bytes
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from JSON bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncryptedCredential;

    #[test]
    fn test_action_tags() {
        let action = Action::authenticate();
        assert!(action.is(Action::AUTHENTICATE));
        assert!(!action.is(Action::NOTIFY_ERROR));
        assert_eq!(action.to_string(), "authenticate");
    }

    #[test]
    fn test_notify_error_body() {
        let msg = Message::notify_error(0, "invalid authenticate message");
        assert!(msg.action.is(Action::NOTIFY_ERROR));

        let body: String = msg.data_as().unwrap();
        assert_eq!(body, "invalid authenticate message");
    }

    #[test]
    fn test_decode_authenticate_message() {
        let raw = br#"{"seq":7,"action":"authenticate","data":{"version":1,"credential":"AAAA"}}"#;
        let msg = Message::decode(raw).unwrap();

        assert_eq!(msg.seq, 7);
        assert!(msg.action.is(Action::AUTHENTICATE));

        let credential: EncryptedCredential = msg.data_as().unwrap();
        assert_eq!(credential.version, 1);
        assert_eq!(credential.credential, "AAAA");
    }

    #[test]
    fn test_missing_data() {
        let msg = Message::decode(br#"{"action":"authenticate"}"#).unwrap();
        let result = msg.data_as::<EncryptedCredential>();
        assert!(matches!(result, Err(ProtocolError::MissingData)));
    }

    #[test]
    fn test_wrong_payload_shape() {
        let msg = Message::new(1, Action::authenticate(), "not a credential").unwrap();
        let result = msg.data_as::<EncryptedCredential>();
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_unknown_action_survives_encode() {
        let msg = Message::new(3, Action::new("message.chat"), "hi").unwrap();
        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }
}
