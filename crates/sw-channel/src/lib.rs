//! The `Channel` trait, login handshake, and control-frame types a concrete
//! transport must speak to plug into the hub (spec §4.4).

pub mod channel;
pub mod control;
pub mod error;
pub mod handshake;
pub mod mock;
pub mod role;

pub use channel::{Channel, ChannelMessage};
pub use control::{Ack, CompressAck, CompressReq, CompressionMode, Ping, Pong, RemoveNode, ResetRequest};
pub use error::ChannelError;
pub use handshake::{ConsumedCodeAnnounce, Login, LoginAck};
pub use mock::LoopbackChannel;
pub use role::Role;
