//! In-memory loopback `Channel`, used by tests and the demo binary in place
//! of a real socket. Grounded on the teacher's `rt-test-utils::MockWsClient`
//! send/recv pair, swapping the WebSocket transport for a pair of
//! `tokio::sync::mpsc` channels.

use tokio::sync::{mpsc, Mutex};

use crate::channel::{Channel, ChannelMessage};
use crate::error::ChannelError;

/// One end of an in-memory channel pair.
pub struct LoopbackChannel {
    tx: mpsc::Sender<ChannelMessage>,
    rx: Mutex<mpsc::Receiver<ChannelMessage>>,
    remote_address: String,
}

impl LoopbackChannel {
    /// Build a connected pair, `a` and `b`, each addressed by the name
    /// given for the other side.
    pub fn pair(capacity: usize, name_a: &str, name_b: &str) -> (Self, Self) {
        let (tx_a, rx_b) = mpsc::channel(capacity);
        let (tx_b, rx_a) = mpsc::channel(capacity);
        let a = LoopbackChannel { tx: tx_a, rx: Mutex::new(rx_a), remote_address: name_b.to_string() };
        let b = LoopbackChannel { tx: tx_b, rx: Mutex::new(rx_b), remote_address: name_a.to_string() };
        (a, b)
    }
}

#[async_trait::async_trait]
impl Channel for LoopbackChannel {
    async fn send(&self, message: ChannelMessage) -> Result<(), ChannelError> {
        self.tx.send(message).await.map_err(|_| ChannelError::Closed)
    }

    async fn recv(&self) -> Result<ChannelMessage, ChannelError> {
        self.rx.lock().await.recv().await.ok_or(ChannelError::Closed)
    }

    fn remote_address(&self) -> String {
        self.remote_address.clone()
    }

    async fn close(&self) {
        self.rx.lock().await.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{CompressionMode, Ping};
    use crate::handshake::Login;
    use crate::role::Role;
    use uuid::Uuid;

    fn sample_login() -> Login {
        Login {
            uuid: Uuid::nil(),
            role: Role::Producer,
            name: "a".into(),
            version: "1".into(),
            core_version: "1".into(),
            user_label: None,
            consumed: vec![],
        }
    }

    #[tokio::test]
    async fn messages_sent_on_one_end_arrive_on_the_other() {
        let (a, b) = LoopbackChannel::pair(8, "a", "b");
        a.send(ChannelMessage::Login(sample_login())).await.unwrap();
        match b.recv().await.unwrap() {
            ChannelMessage::Login(login) => assert_eq!(login.name, "a"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_address_reports_the_other_side() {
        let (a, b) = LoopbackChannel::pair(8, "alice", "bob");
        assert_eq!(a.remote_address(), "bob");
        assert_eq!(b.remote_address(), "alice");
    }

    #[tokio::test]
    async fn recv_after_close_returns_closed_error() {
        let (a, b) = LoopbackChannel::pair(8, "a", "b");
        a.close().await;
        drop(a);
        assert!(matches!(b.recv().await, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn is_bidirectional() {
        let (a, b) = LoopbackChannel::pair(8, "a", "b");
        b.send(ChannelMessage::Ping(Ping)).await.unwrap();
        assert!(matches!(a.recv().await.unwrap(), ChannelMessage::Ping(Ping)));
        a.send(ChannelMessage::CompressReq(crate::control::CompressReq { mode: CompressionMode::Zip }))
            .await
            .unwrap();
        match b.recv().await.unwrap() {
            ChannelMessage::CompressReq(req) => assert_eq!(req.mode, CompressionMode::Zip),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
