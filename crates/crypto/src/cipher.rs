//! CBC credential cipher

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Invalid base64: {0}")]
    BadEncoding(#[from] base64::DecodeError),

    #[error("Decryption failed")]
    BadCipherText,
}

/// Length of the key derived from the shared secret
pub const KEY_LEN: usize = 16;

/// Derive the credential key from the configured shared secret (MD5 digest)
pub fn derive_key(secret: &str) -> [u8; KEY_LEN] {
    md5::compute(secret.as_bytes()).0
}

/// Block cipher and mode used for credential blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CipherSuite {
    /// Triple DES (EDE) in CBC mode
    #[default]
    #[serde(rename = "des-ede3-cbc")]
    TripleDesCbc,

    /// AES-128 in CBC mode
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
}

impl CipherSuite {
    /// OpenSSL-style algorithm name
    pub fn name(&self) -> &'static str {
        match self {
            CipherSuite::TripleDesCbc => "des-ede3-cbc",
            CipherSuite::Aes128Cbc => "aes-128-cbc",
        }
    }

    /// Look up a suite by its algorithm name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "des-ede3-cbc" => Some(CipherSuite::TripleDesCbc),
            "aes-128-cbc" => Some(CipherSuite::Aes128Cbc),
            _ => None,
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Credential cipher: a suite plus the derived key
///
/// The IV is empty on the wire, which the issuing side zero-pads to the block size.
#[derive(Clone)]
pub struct CredentialCipher {
    suite: CipherSuite,
    key: [u8; KEY_LEN],
}

impl CredentialCipher {
    /// Create a cipher from an already derived key
    pub fn new(suite: CipherSuite, key: [u8; KEY_LEN]) -> Self {
        Self { suite, key }
    }

    /// Create a cipher from the configured shared secret
    pub fn from_secret(suite: CipherSuite, secret: &str) -> Self {
        Self::new(suite, derive_key(secret))
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Encrypt with PKCS#7 padding
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        match self.suite {
            CipherSuite::TripleDesCbc => TdesCbcEnc::new(&self.tdes_key().into(), &[0u8; 8].into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            CipherSuite::Aes128Cbc => Aes128CbcEnc::new(&self.key.into(), &[0u8; 16].into())
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        }
    }

    /// Decrypt and strip PKCS#7 padding
    ///
    /// Fails on a length that is not a multiple of the block size or on invalid padding.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let result = match self.suite {
            CipherSuite::TripleDesCbc => TdesCbcDec::new(&self.tdes_key().into(), &[0u8; 8].into())
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            CipherSuite::Aes128Cbc => Aes128CbcDec::new(&self.key.into(), &[0u8; 16].into())
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        result.map_err(|_| CipherError::BadCipherText)
    }

    /// Encrypt and base64-encode (standard alphabet, padded)
    pub fn seal(&self, plaintext: &[u8]) -> String {
        STANDARD.encode(self.encrypt(plaintext))
    }

    /// base64-decode and decrypt
    ///
    /// CR and LF are skipped, so line-wrapped encodings are accepted.
    pub fn open(&self, encoded: &str) -> Result<Vec<u8>, CipherError> {
        let ciphertext = if encoded.contains(['\r', '\n']) {
            let unwrapped: String = encoded.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
            STANDARD.decode(unwrapped)?
        } else {
            STANDARD.decode(encoded)?
        };
        self.decrypt(&ciphertext)
    }

    /// Expand the 16-byte key to K1 || K2 || K1
    fn tdes_key(&self) -> [u8; 24] {
        let mut key = [0u8; 24];
        key[..KEY_LEN].copy_from_slice(&self.key);
        key[KEY_LEN..].copy_from_slice(&self.key[..8]);
        key
    }
}

impl fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("suite", &self.suite)
            .field("key", &"<redacted>")
            .finish()
    }
}
