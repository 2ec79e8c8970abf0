//! Identity registry

use crate::{Client, ClientId, FieldMatch, GateConfig, RegistryError};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::{debug, info};

/// Gateway-wide mapping from identity to connection
#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    /// Rebind the connection currently addressed as `old` to `new`.
    ///
    /// An error means `new` is already bound or `old` is unknown; the
    /// connection keeps its old identity in that case.
    async fn set_client_id(&self, old: &ClientId, new: &ClientId) -> Result<(), RegistryError>;
}

/// In-process registry of the connections attached to one gateway
pub struct MemoryRegistry {
    /// Gateway name written into rebound identities
    gateway: String,

    field_match: FieldMatch,

    clients: DashMap<ClientId, Arc<dyn Client>>,
}

impl MemoryRegistry {
    pub fn new(gateway: impl Into<String>, field_match: FieldMatch) -> Arc<Self> {
        Arc::new(Self {
            gateway: gateway.into(),
            field_match,
            clients: DashMap::new(),
        })
    }

    /// Create a registry named by `gateway.name` using `auth.field_match`
    pub fn from_config(config: &GateConfig) -> Arc<Self> {
        Self::new(config.gateway.name.clone(), config.auth.field_match)
    }

    /// Attach a connection under its current identity, replacing any previous entry
    pub fn register(&self, client: Arc<dyn Client>) -> ClientId {
        let id = client.info().id;
        debug!("Registered client {}", id);
        self.clients.insert(id.clone(), client);
        id
    }

    pub fn unregister(&self, id: &ClientId) -> Option<Arc<dyn Client>> {
        self.clients.remove(id).map(|(_, client)| client)
    }

    pub fn get(&self, id: &ClientId) -> Option<Arc<dyn Client>> {
        self.clients.get(id).map(|entry| entry.value().clone())
    }

    /// Detach and close a connection
    pub fn exit_client(&self, id: &ClientId) -> bool {
        match self.unregister(id) {
            Some(client) => {
                client.exit();
                true
            }
            None => false,
        }
    }

    /// Get number of attached connections
    pub fn count(&self) -> usize {
        self.clients.len()
    }
}

#[async_trait]
impl IdentityRegistry for MemoryRegistry {
    async fn set_client_id(&self, old: &ClientId, new: &ClientId) -> Result<(), RegistryError> {
        let mut new = new.clone();
        new.set_gateway_with(&self.gateway, self.field_match);

        let (_, client) = self
            .clients
            .remove(old)
            .ok_or_else(|| RegistryError::NotFound(old.clone()))?;

        // Entry guard is released before the old entry is restored or a stale client exits
        let outcome = match self.clients.entry(new.clone()) {
            Entry::Occupied(entry) if entry.get().is_running() => Rebind::Conflict,
            Entry::Occupied(mut entry) => Rebind::Replaced(entry.insert(client.clone())),
            Entry::Vacant(entry) => {
                entry.insert(client.clone());
                Rebind::Bound
            }
        };

        match outcome {
            Rebind::Conflict => {
                self.clients.insert(old.clone(), client);
                return Err(RegistryError::IdentityConflict(new));
            }
            Rebind::Replaced(stale) => {
                debug!("Dropping stale client bound to {}", new);
                stale.exit();
            }
            Rebind::Bound => {}
        }

        client.set_id(new.clone());
        info!("Client {} rebound to {}", old, new);
        Ok(())
    }
}

enum Rebind {
    Conflict,
    Replaced(Arc<dyn Client>),
    Bound,
}
