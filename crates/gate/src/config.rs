//! Gateway configuration

use crate::{FieldMatch, ID_SEPARATOR};
use anyhow::{Result, bail};
use gatelink_crypto::{CipherSuite, CredentialCipher};
use serde::Deserialize;
use std::path::Path;

/// Gateway configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GateConfig {
    /// Gateway identity
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Credential authentication
    #[serde(default)]
    pub auth: AuthConfig,
}

impl GateConfig {
    /// Load configuration from file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway.name.contains(ID_SEPARATOR) {
            bail!(
                "gateway name {:?} must not contain '{}'",
                self.gateway.name,
                ID_SEPARATOR
            );
        }
        Ok(())
    }
}

/// Gateway identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Name written into the gateway field of bound identities
    #[serde(default = "default_gateway_name")]
    pub name: String,
}

fn default_gateway_name() -> String {
    "gw0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: default_gateway_name(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Secret shared with the business service
    #[serde(default)]
    pub secret: Option<String>,

    /// Credential cipher ("des-ede3-cbc" or "aes-128-cbc")
    #[serde(default)]
    pub cipher: CipherSuite,

    /// No-op check for identity field replacement ("legacy" or "strict")
    #[serde(default)]
    pub field_match: FieldMatch,
}

impl AuthConfig {
    /// Build the credential cipher from the configured secret
    pub fn build_cipher(&self) -> Result<CredentialCipher> {
        match &self.secret {
            Some(secret) if !secret.is_empty() => Ok(CredentialCipher::from_secret(self.cipher, secret)),
            _ => bail!("auth.secret is not configured"),
        }
    }
}
