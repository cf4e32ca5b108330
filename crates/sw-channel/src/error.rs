//! Channel errors (spec §7 `TransientIO`).

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
    #[error("login refused: both sides declared role {0:?}")]
    RoleConflict(crate::role::Role),
    #[error("malformed control frame: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(String),
}
