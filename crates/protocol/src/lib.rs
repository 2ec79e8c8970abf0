//! Gatelink Protocol - Message envelope and credential payloads
//!
//! This crate defines the data exchanged between a client connection and the gateway:
//! - `Message`: the JSON envelope every inbound and outbound unit travels in
//! - `Action`: the string tag that routes a message
//! - `EncryptedCredential`/`AuthCredentials`: the business-issued authentication payload
//!
//! Field names follow the wire format shared with the issuing business service,
//! so serde renames here must not change.

mod credential;
mod message;

pub use credential::*;
pub use message::*;
