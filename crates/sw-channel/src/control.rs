//! Control frames: `^Reset`, `^RemoveNode`, `^ACK`, `$Ping`/`$Pong`,
//! `$CompressReq`/`$CompressAck` (spec §4.4).

use uuid::Uuid;

/// Negotiated per-channel compression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    None,
    Logical,
    Zip,
    Full,
}

impl CompressionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMode::None => "none",
            CompressionMode::Logical => "logical",
            CompressionMode::Zip => "zip",
            CompressionMode::Full => "full",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(CompressionMode::None),
            "logical" => Some(CompressionMode::Logical),
            "zip" => Some(CompressionMode::Zip),
            "full" => Some(CompressionMode::Full),
            _ => None,
        }
    }
}

/// `^Reset`: a request to resend everything known about the listed codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    pub object_codes: Vec<String>,
    pub requestor: Uuid,
    pub target: Option<Uuid>,
    pub deploy_time: i64,
    pub sequential_id: u32,
    pub origin_app: String,
}

/// `^RemoveNode`: broadcast when a node becomes unreachable via any channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveNode {
    pub node: Uuid,
}

/// `^ACK,objCode,ackerUUID,destinationUUID,serial`: lossless delivery ack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub object_code: String,
    pub acker: Uuid,
    pub destination: Uuid,
    pub serial: u64,
}

/// `$Ping` / `$Pong` keepalive pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong;

/// `$CompressReq` / `$CompressAck`: negotiate `CompressionMode` for the rest
/// of the channel's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressReq {
    pub mode: CompressionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressAck {
    pub accepted: CompressionMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_mode_round_trips_through_str() {
        for mode in [CompressionMode::None, CompressionMode::Logical, CompressionMode::Zip, CompressionMode::Full] {
            assert_eq!(CompressionMode::parse(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn unknown_compression_mode_is_none() {
        assert_eq!(CompressionMode::parse("bogus"), None);
    }
}
