//! Authentication credential structures

use serde::{Deserialize, Serialize};

/// Encrypted credential as sent by the client in an `authenticate` message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EncryptedCredential {
    /// Payload format version
    pub version: i32,

    /// base64(CBC(JSON(AuthCredentials)))
    pub credential: String,
}

/// Client permission ticket
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientTicket {
    /// Secret generated and kept by the business service, used to verify
    /// per-message signatures. Clients never see it.
    pub secret: String,
}

/// Decrypted client authentication credentials
///
/// Generated by the business service, encrypted with the gateway's shared
/// secret and handed to the client, which forwards it unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    /// Client type
    #[serde(rename = "type")]
    pub client_type: i32,

    /// Business-level user id
    pub user_id: String,

    /// Device id, unique per user
    pub device_id: String,

    /// Permission ticket
    pub ticket: Option<ClientTicket>,

    /// Temporary connection id generated by the client
    pub connection_id: String,

    /// Issuance timestamp
    pub timestamp: i64,
}
