//! Credential authentication
//!
//! A client proves who it is by sending an `authenticate` message carrying an
//! `EncryptedCredential` issued by the business service. The authenticator
//! decrypts it with the gateway-wide key and asks the identity registry to
//! rebind the connection from its temporary identity to `_<user_id>_<device_id>`.

use crate::{AuthError, AuthMetrics, Client, ClientId, IdentityRegistry};
use gatelink_crypto::{CipherSuite, CredentialCipher};
use gatelink_protocol::{Action, AuthCredentials, EncryptedCredential, Message};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Body of the error notification sent for any rejected authenticate message.
/// The failing stage is never disclosed to the client.
pub const INVALID_AUTHENTICATE_MESSAGE: &str = "invalid authenticate message";

/// Credential version written by `issue`
pub const CREDENTIAL_VERSION: i32 = 1;

/// Credential wire format: base64(CBC(JSON(AuthCredentials)))
#[derive(Debug, Clone)]
pub struct CredentialCodec {
    cipher: CredentialCipher,
}

impl CredentialCodec {
    pub fn new(cipher: CredentialCipher) -> Self {
        Self { cipher }
    }

    pub fn suite(&self) -> CipherSuite {
        self.cipher.suite()
    }

    /// Decrypt and parse a credential
    pub fn decrypt(&self, credential: &EncryptedCredential) -> Result<AuthCredentials, AuthError> {
        let plaintext = self.cipher.open(&credential.credential)?;
        serde_json::from_slice(&plaintext).map_err(|_| AuthError::BadFormat)
    }

    /// Encrypt credentials the way the business service issues them
    pub fn issue(&self, credentials: &AuthCredentials) -> Result<EncryptedCredential, AuthError> {
        let plaintext = serde_json::to_vec(credentials).map_err(|_| AuthError::BadFormat)?;
        Ok(EncryptedCredential {
            version: CREDENTIAL_VERSION,
            credential: self.cipher.seal(&plaintext),
        })
    }
}

/// Gateway-wide authenticator
///
/// Immutable after construction; share one instance across all connection tasks.
pub struct Authenticator {
    codec: CredentialCodec,
    registry: Arc<dyn IdentityRegistry>,
    metrics: Option<AuthMetrics>,
}

impl Authenticator {
    /// Create a new authenticator
    pub fn new(cipher: CredentialCipher, registry: Arc<dyn IdentityRegistry>) -> Self {
        Self {
            codec: CredentialCodec::new(cipher),
            registry,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: AuthMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn suite(&self) -> CipherSuite {
        self.codec.suite()
    }

    /// Handle an inbound message if it is an authenticate message.
    ///
    /// Returns false for any other action without touching the client. Every
    /// authenticate message is consumed: on failure the client gets a single
    /// error notification; when the registry refuses the rebind the decrypted
    /// credentials are stored on the client instead.
    pub async fn intercept(&self, client: &dyn Client, message: &Message) -> bool {
        if !message.action.is(Action::AUTHENTICATE) {
            return false;
        }
        self.count(|m| &m.attempts);

        let credentials = match self.verify(message) {
            Ok(credentials) => credentials,
            Err(e) => {
                debug!("Rejected authenticate message from {}: {}", client.info().id, e);
                self.count(|m| &m.failures);
                let notice = Message::notify_error(0, INVALID_AUTHENTICATE_MESSAGE);
                if let Err(e) = client.enqueue_message(notice) {
                    warn!("Failed to notify client {}: {}", client.info().id, e);
                }
                return true;
            }
        };

        match self.rebind(client, &credentials).await {
            Ok(id) => {
                info!("Authenticated {} (type {})", id, credentials.client_type);
                self.count(|m| &m.rebinds);
            }
            Err(e) => {
                warn!(
                    "Keeping identity for user {} device {}: {}",
                    credentials.user_id, credentials.device_id, e
                );
                self.count(|m| &m.fallbacks);
                client.set_credentials(credentials);
            }
        }
        true
    }

    /// Decrypt and parse a credential
    pub fn decrypt(&self, credential: &EncryptedCredential) -> Result<AuthCredentials, AuthError> {
        self.codec.decrypt(credential)
    }

    pub fn issue(&self, credentials: &AuthCredentials) -> Result<EncryptedCredential, AuthError> {
        self.codec.issue(credentials)
    }

    fn verify(&self, message: &Message) -> Result<AuthCredentials, AuthError> {
        let credential: EncryptedCredential =
            message.data_as().map_err(|_| AuthError::MalformedMessage)?;
        debug!("Credential version {}", credential.version);
        self.decrypt(&credential)
    }

    async fn rebind(
        &self,
        client: &dyn Client,
        credentials: &AuthCredentials,
    ) -> Result<ClientId, AuthError> {
        let old = client.info().id;
        let new = ClientId::new("", &credentials.user_id, &credentials.device_id);
        self.registry.set_client_id(&old, &new).await?;
        Ok(new)
    }

    fn count(&self, counter: impl Fn(&AuthMetrics) -> &prometheus::IntCounter) {
        if let Some(metrics) = &self.metrics {
            counter(metrics).inc();
        }
    }
}
