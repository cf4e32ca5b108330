//! The `Channel` trait: the transport-agnostic surface `sw-hub` drives.
//! Concrete transports (TCP, WebSocket, file) implement this; tests and the
//! demo binary use the in-memory loopback in `mock`.

use async_trait::async_trait;
use sw_wire::Frame;

use crate::control::{Ack, CompressAck, CompressReq, Ping, Pong, RemoveNode, ResetRequest};
use crate::error::ChannelError;
use crate::handshake::{Login, LoginAck};

/// Everything that can cross a channel: data frames plus every control
/// message from spec §4.4.
#[derive(Debug, Clone)]
pub enum ChannelMessage {
    Login(Login),
    LoginAck(LoginAck),
    Data(Frame),
    Reset(ResetRequest),
    RemoveNode(RemoveNode),
    Ack(Ack),
    Ping(Ping),
    Pong(Pong),
    CompressReq(CompressReq),
    CompressAck(CompressAck),
}

/// One newline-terminated, UTF-8 message stream to a peer (spec §6 "Wire
/// protocol"). Implementors own their own read/write halves; `send`/`recv`
/// take `&self` so the hub can hold one `Arc<dyn Channel>` per peer and
/// drive an inbound task and an outbound task concurrently.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send(&self, message: ChannelMessage) -> Result<(), ChannelError>;
    async fn recv(&self) -> Result<ChannelMessage, ChannelError>;

    /// Human-readable remote endpoint, used in logs and `filterDestination`.
    fn remote_address(&self) -> String;

    async fn close(&self);
}
