//! Hub errors.

use crate::ChannelId;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("channel {0:?} not registered")]
    UnknownChannel(ChannelId),
    #[error("login refused: both sides declared role {0:?}")]
    RoleConflict(sw_channel::Role),
    #[error("frame carries a non-numeric sequence token: {0}")]
    BadSeqToken(String),
    #[error(transparent)]
    Channel(#[from] sw_channel::ChannelError),
    #[error(transparent)]
    Lossless(#[from] sw_lossless::LosslessError),
}
