//! Client connection abstraction

use crate::{ClientError, ClientId};
use gatelink_protocol::{AuthCredentials, Message};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::debug;

/// Per-connection metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Identity the connection is addressed by
    pub id: ClientId,

    /// Connection id generated by the client
    pub connection_id: String,

    /// Client protocol version
    pub version: String,

    /// Last time the client was seen (ms since Unix epoch)
    pub alive_at: i64,

    /// Connect time (ms since Unix epoch)
    pub connection_at: i64,

    /// Name of the gateway the client is connected to
    pub gateway: String,

    /// Peer address
    pub cli_addr: String,
}

impl ClientInfo {
    /// Metadata for a freshly accepted connection
    pub fn new(id: ClientId, gateway: impl Into<String>, cli_addr: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id,
            connection_id: String::new(),
            version: String::new(),
            alive_at: now,
            connection_at: now,
            gateway: gateway.into(),
            cli_addr: cli_addr.into(),
        }
    }
}

/// A client connection as seen by the gateway
///
/// The run loop that reads from and writes to the transport lives with the
/// implementation; the gateway only needs these handles.
pub trait Client: Send + Sync {
    /// Update the identity the connection is addressed by
    fn set_id(&self, id: ClientId);

    /// True while the connection is alive
    fn is_running(&self) -> bool;

    /// Queue a message for delivery. Must not block.
    fn enqueue_message(&self, message: Message) -> Result<(), ClientError>;

    /// Close the connection
    fn exit(&self);

    /// Snapshot of the connection metadata
    fn info(&self) -> ClientInfo;

    /// Keep decrypted credentials on the connection
    fn set_credentials(&self, credentials: AuthCredentials);
}

/// Client backed by a bounded channel drained by the connection's writer task
pub struct ChannelClient {
    info: RwLock<ClientInfo>,
    credentials: Mutex<Option<AuthCredentials>>,
    running: AtomicBool,
    sender: Sender<Message>,
}

impl ChannelClient {
    /// Create a client and the receiving end of its outbound queue
    pub fn new(info: ClientInfo, capacity: usize) -> (Arc<Self>, Receiver<Message>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let client = Arc::new(Self {
            info: RwLock::new(info),
            credentials: Mutex::new(None),
            running: AtomicBool::new(true),
            sender,
        });
        (client, receiver)
    }

    /// Credentials stored by `set_credentials`
    pub fn credentials(&self) -> Option<AuthCredentials> {
        self.credentials.lock().clone()
    }
}

impl Client for ChannelClient {
    fn set_id(&self, id: ClientId) {
        let mut info = self.info.write();
        debug!("Client {} now addressed as {}", info.id, id);
        info.id = id;
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.sender.is_closed()
    }

    fn enqueue_message(&self, message: Message) -> Result<(), ClientError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(ClientError::Closed);
        }
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => ClientError::QueueFull,
            TrySendError::Closed(_) => ClientError::Closed,
        })
    }

    fn exit(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!("Client {} exited", self.info.read().id);
        }
    }

    fn info(&self) -> ClientInfo {
        self.info.read().clone()
    }

    fn set_credentials(&self, credentials: AuthCredentials) {
        *self.credentials.lock() = Some(credentials);
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatelink_protocol::Action;

    fn client(capacity: usize) -> (Arc<ChannelClient>, Receiver<Message>) {
        let info = ClientInfo::new(ClientId::anonymous("tmp@1"), "gw1", "127.0.0.1:4000");
        ChannelClient::new(info, capacity)
    }

    #[test]
    fn test_info_snapshot() {
        let (client, _rx) = client(4);
        let info = client.info();

        assert_eq!(info.id.to_string(), "_tmp@1_");
        assert_eq!(info.gateway, "gw1");
        assert_eq!(info.alive_at, info.connection_at);
    }

    #[test]
    fn test_set_id() {
        let (client, _rx) = client(4);
        client.set_id(ClientId::new("gw1", "u1", "web"));
        assert_eq!(client.info().id.to_string(), "gw1_u1_web");
    }

    #[tokio::test]
    async fn test_enqueue_delivers() {
        let (client, mut rx) = client(4);
        client
            .enqueue_message(Message::notify_error(0, "boom"))
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert!(msg.action.is(Action::NOTIFY_ERROR));
    }

    #[test]
    fn test_enqueue_full() {
        let (client, _rx) = client(1);
        client.enqueue_message(Message::notify_error(0, "a")).unwrap();

        let result = client.enqueue_message(Message::notify_error(0, "b"));
        assert_eq!(result, Err(ClientError::QueueFull));
    }

    #[test]
    fn test_enqueue_after_exit() {
        let (client, _rx) = client(4);
        assert!(client.is_running());

        client.exit();
        assert!(!client.is_running());
        assert_eq!(
            client.enqueue_message(Message::notify_error(0, "a")),
            Err(ClientError::Closed)
        );
    }

    #[test]
    fn test_receiver_dropped() {
        let (client, rx) = client(4);
        drop(rx);

        assert!(!client.is_running());
        assert_eq!(
            client.enqueue_message(Message::notify_error(0, "a")),
            Err(ClientError::Closed)
        );
    }

    #[test]
    fn test_credentials_storage() {
        let (client, _rx) = client(4);
        assert!(client.credentials().is_none());

        let creds = AuthCredentials {
            client_type: 1,
            user_id: "u1".to_string(),
            device_id: "web".to_string(),
            ticket: None,
            connection_id: "c1".to_string(),
            timestamp: 1,
        };
        client.set_credentials(creds.clone());
        assert_eq!(client.credentials(), Some(creds));
    }
}
