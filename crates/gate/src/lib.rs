//! Gatelink Gate - Client identity and authentication
//!
//! This crate provides:
//! - `ClientId`: the `<gateway>_<user>_<device>` identity every connection is addressed by
//! - `Client`/`IdentityRegistry`: the connection and registry seams the gateway plugs into
//! - `MemoryRegistry`: an in-process registry that rebinds connection identities
//! - `Authenticator`: decrypts business-issued credentials and rebinds the connection
//! - `GateConfig`: TOML configuration for the above

mod auth;
mod client;
mod config;
mod error;
mod id;
mod metrics;
mod registry;

pub use auth::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use id::*;
pub use metrics::*;
pub use registry::*;
