//! Integration Test Harness
#![allow(dead_code)]
//!
//! Builds an in-process gateway: one shared authenticator, a memory registry
//! and channel-backed client connections.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use gatelink_crypto::{CipherSuite, CredentialCipher};
use gatelink_gate::{Authenticator, ChannelClient, ClientId, ClientInfo, FieldMatch, MemoryRegistry};
use gatelink_protocol::{Action, AuthCredentials, EncryptedCredential, Message};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;

pub const SECRET: &str = "shared-secret";
pub const GATEWAY: &str = "gw1";

const OPENSSL_TDES_U1_WEB: &str = "NWVmb1rhonRTzXTT7pxFRU5MfgG9EjpG3IEO8/ZXS85gB2BlSf7z0r4FPyswyn533QS5Jhm//twHQyYJBeq/H/FIlAn9nuNHU/OijNMS48FTdOUyWmjbrGLUiZx3YKrncsUyX7YbnbI=";
const OPENSSL_AES_U1_WEB: &str = "XrneY97SwxxsYcvvImy4cA//YlcaSI3FAHKKViNKbIsS34sB0BpdvWanQxEAeiqa7Ea0drTp04UFMNHPOR8L6gLTF+Moi4mOWiKjLTBHl+16xE5EK1ObkISpYNyIdGMFQLVUAqt6AkCpX7TLgR0pQQ==";

/// Test gateway
pub struct TestGateway {
    pub registry: Arc<MemoryRegistry>,
    pub authenticator: Arc<Authenticator>,
}

impl TestGateway {
    pub fn new(suite: CipherSuite, field_match: FieldMatch) -> Self {
        let registry = MemoryRegistry::new(GATEWAY, field_match);
        let cipher = CredentialCipher::from_secret(suite, SECRET);
        let authenticator = Arc::new(Authenticator::new(cipher, registry.clone()));
        Self {
            registry,
            authenticator,
        }
    }

    /// Accept a connection under a fresh temporary identity
    pub fn connect(&self) -> (Arc<ChannelClient>, Receiver<Message>) {
        let info = ClientInfo::new(ClientId::temporary(), GATEWAY, "127.0.0.1:50000");
        let (client, rx) = ChannelClient::new(info, 16);
        self.registry.register(client.clone());
        (client, rx)
    }
}

impl Default for TestGateway {
    fn default() -> Self {
        Self::new(CipherSuite::TripleDesCbc, FieldMatch::Legacy)
    }
}

/// Credentials as issued by the business service
pub fn credentials(user_id: &str, device_id: &str) -> AuthCredentials {
    AuthCredentials {
        client_type: 1,
        user_id: user_id.to_string(),
        device_id: device_id.to_string(),
        ticket: None,
        connection_id: "c1".to_string(),
        timestamp: 1_700_000_000,
    }
}

/// Encrypt credentials the way the business service does, using the block
/// ciphers directly rather than the gateway's `CredentialCipher`
pub fn seal(suite: CipherSuite, secret: &str, credentials: &AuthCredentials) -> EncryptedCredential {
    let key = md5::compute(secret.as_bytes()).0;
    let plaintext = issuer_json(credentials);
    let ciphertext = match suite {
        CipherSuite::TripleDesCbc => cbc::Encryptor::<des::TdesEde2>::new(&key.into(), &[0u8; 8].into())
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext),
        CipherSuite::Aes128Cbc => cbc::Encryptor::<aes::Aes128>::new(&key.into(), &[0u8; 16].into())
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext),
    };
    EncryptedCredential {
        version: 1,
        credential: STANDARD.encode(ciphertext),
    }
}

/// Known-answer credential for `credentials("u1", "web")` under `SECRET`,
/// produced with `openssl enc` and an all-zero IV
pub fn openssl_credential(suite: CipherSuite) -> EncryptedCredential {
    let credential = match suite {
        CipherSuite::TripleDesCbc => OPENSSL_TDES_U1_WEB,
        CipherSuite::Aes128Cbc => OPENSSL_AES_U1_WEB,
    };
    EncryptedCredential {
        version: 1,
        credential: credential.to_string(),
    }
}

pub fn authenticate_message(credential: &EncryptedCredential) -> Message {
    Message::new(1, Action::authenticate(), credential).expect("credential serializes")
}

/// JSON as the issuing service writes it (ticket omitted as null)
fn issuer_json(credentials: &AuthCredentials) -> Vec<u8> {
    format!(
        r#"{{"type":{},"user_id":"{}","device_id":"{}","ticket":null,"connection_id":"{}","timestamp":{}}}"#,
        credentials.client_type,
        credentials.user_id,
        credentials.device_id,
        credentials.connection_id,
        credentials.timestamp
    )
    .into_bytes()
}
