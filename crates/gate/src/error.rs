//! Error types

use crate::ClientId;
use gatelink_crypto::CipherError;
use thiserror::Error;

/// Authentication failures, scoped to the authenticating connection
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authenticate payload does not deserialize")]
    MalformedMessage,

    #[error("Credential is not valid base64")]
    BadEncoding,

    #[error("Credential does not decrypt")]
    BadCipherText,

    #[error("Decrypted credential is not a valid record")]
    BadFormat,

    #[error("Identity rebind rejected: {0}")]
    IdentityConflict(#[from] RegistryError),
}

impl From<CipherError> for AuthError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::BadEncoding(_) => AuthError::BadEncoding,
            CipherError::BadCipherText => AuthError::BadCipherText,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Identity {0} is already bound")]
    IdentityConflict(ClientId),

    #[error("Client {0} not found")]
    NotFound(ClientId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Client connection closed")]
    Closed,

    #[error("Client message queue full")]
    QueueFull,
}
