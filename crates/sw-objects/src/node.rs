//! `Node` (the running process, spec §3) and `RemoteNode` (the per-peer
//! bookkeeping record). `RemoteNode` deliberately stops short of holding the
//! actual lossless pipe or query objects — those live one layer up in
//! `sw-lossless`/`sw-query`/`sw-hub`, which would otherwise have to be
//! dependencies of this crate. It carries only the data `sw-sequencer` and
//! `sw-hub` need to decide *how* to deliver to this peer.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A running process (spec §3 "Node"): this node's own identity, or what we
/// know about a peer before/alongside its `RemoteNode` bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub uuid: Uuid,
    pub name: String,
    pub version: String,
    pub core_version: String,
    pub remote_address: Option<String>,
    pub user_label: Option<String>,
    pub app_params: HashMap<String, String>,
}

impl NodeInfo {
    pub fn new(uuid: Uuid, name: impl Into<String>, version: impl Into<String>, core_version: impl Into<String>) -> Self {
        NodeInfo {
            uuid,
            name: name.into(),
            version: version.into(),
            core_version: core_version.into(),
            remote_address: None,
            user_label: None,
            app_params: HashMap::new(),
        }
    }
}

/// How a produced `ObjectCode` is delivered to one particular consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Delivered through a durable lossless pipe (handle owned by `sw-hub`).
    Lossless,
    /// Deduplicated with a plain modulo sequence counter.
    Modulo,
}

/// Per-`ObjectCode` consumption declared by a peer at login.
#[derive(Debug, Clone)]
pub struct ConsumedCode {
    pub object_code: String,
    pub mode: DeliveryMode,
}

/// Bookkeeping for one connected (or recently connected) peer (spec §3
/// "Remote-node record").
#[derive(Debug, Clone)]
pub struct RemoteNode {
    pub info: NodeInfo,
    pub consumed: Vec<ConsumedCode>,
    pub last_deploy_time: i64,
    pub connected: bool,
    pub connected_since: i64,
    /// Query ids this peer originated at us and is still awaiting a
    /// terminal reply for.
    pub pending_queries: HashSet<u32>,
    /// Next expected inbound object sequence per `ObjectCode`.
    pub next_expected_seq: HashMap<String, u32>,
}

impl RemoteNode {
    pub fn new(info: NodeInfo) -> Self {
        RemoteNode {
            info,
            consumed: Vec::new(),
            last_deploy_time: 0,
            connected: false,
            connected_since: 0,
            pending_queries: HashSet::new(),
            next_expected_seq: HashMap::new(),
        }
    }

    pub fn consumes(&self, object_code: &str) -> bool {
        self.consumed.iter().any(|c| c.object_code == object_code)
    }

    pub fn delivery_mode(&self, object_code: &str) -> Option<DeliveryMode> {
        self.consumed.iter().find(|c| c.object_code == object_code).map(|c| c.mode)
    }

    /// A newer deploy-time for this peer clears its per-code counters and
    /// pending-query map (spec §4.5 step 3).
    pub fn note_deploy_time(&mut self, deploy_time: i64) {
        if deploy_time > self.last_deploy_time {
            self.last_deploy_time = deploy_time;
            self.next_expected_seq.clear();
            self.pending_queries.clear();
        }
    }
}
