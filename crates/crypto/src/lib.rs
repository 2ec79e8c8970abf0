//! Gatelink Crypto - Credential encryption shared with the issuing business service
//!
//! This crate provides:
//! - MD5 key derivation from the configured shared secret
//! - 3DES-EDE-CBC and AES-128-CBC with a zero IV and PKCS#7 padding
//! - base64 sealing/opening of credential blobs
//!
//! The algorithms are a compatibility contract with credentials issued elsewhere.
//! There is no MAC: tampering is only detected through padding validation.

mod cipher;

pub use cipher::*;
