//! Fan-out and routing (spec §4.5): per-channel sequencing, local dispatch,
//! filtered forwarding, lossless-vs-modulo delivery choice, and node
//! disconnect bookkeeping.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use sw_channel::{Channel, ChannelMessage, Role};
use sw_channel::{Login, LoginAck, ResetRequest};
use sw_lossless::{LosslessPipe, PipeParams};
use sw_objects::{now_centis, ConsumedCode, DeliveryMode, NodeInfo};
use sw_sequencer::{SeqOutcome, Sequencer};
use sw_wire::Frame;
use uuid::Uuid;

use crate::error::HubError;
use crate::node_table::NodeTable;

/// Handle to one registered channel. Stable for the channel's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

/// Receives frames this node consumes locally, after sequencing but before
/// any forwarding decision. Implemented by `spiderwiz::dispatcher`.
pub trait LocalSink: Send + Sync {
    fn dispatch_local(&self, frame: &Frame);
}

/// A destination filter a local producer may install for one `ObjectCode`
/// (spec §4.5's `filterDestination(remoteUUID, name, userLabel,
/// remoteAddress, appParams) -> bool`).
pub type DestinationFilter = dyn Fn(&sw_objects::RemoteNode) -> bool + Send + Sync;

struct ChannelEntry {
    channel: std::sync::Arc<dyn Channel>,
    role: Role,
    remote_uuid: Mutex<Option<Uuid>>,
    inbound: Sequencer,
    outbound: Sequencer,
}

/// Outcome of routing one inbound frame.
#[derive(Debug)]
pub enum RouteOutcome {
    /// `frame.origin` is this node itself: we are seeing our own update
    /// come back around the mesh and must not re-dispatch or re-forward it
    /// (spec §4.5 step 1).
    Boomerang,
    Duplicate,
    /// A frame claiming to be newer than a later one this node already
    /// accepted from the same `(origin, ObjectCode)` pair, dropped by the
    /// cross-mesh monotonic check (spec §4.5 step 2, spec §5).
    StaleOrigin,
    OutOfSequence { reset_requested: bool },
    Delivered { dispatched_locally: bool, forwarded: Vec<ChannelId>, lossless_queued: Vec<ChannelId> },
}

/// Which peers became unreachable, and which object-codes no remaining peer
/// still needs, after a channel drops (spec §4.5 "On channel disconnect").
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisconnectReport {
    pub dropped_nodes: Vec<Uuid>,
    pub orphaned_codes: Vec<String>,
}

pub struct Hub {
    self_info: NodeInfo,
    nodes: NodeTable,
    channels: RwLock<HashMap<ChannelId, std::sync::Arc<ChannelEntry>>>,
    next_channel_id: AtomicU64,
    filters: RwLock<HashMap<String, std::sync::Arc<DestinationFilter>>>,
    local_consumed: RwLock<HashSet<String>>,
    lossless_dir: PathBuf,
    lossless_pipes: RwLock<HashMap<(String, Uuid), std::sync::Arc<LosslessPipe>>>,
}

impl Hub {
    pub fn new(self_info: NodeInfo, lossless_dir: impl Into<PathBuf>) -> Self {
        Hub {
            self_info,
            nodes: NodeTable::new(),
            channels: RwLock::new(HashMap::new()),
            next_channel_id: AtomicU64::new(1),
            filters: RwLock::new(HashMap::new()),
            local_consumed: RwLock::new(HashSet::new()),
            lossless_dir: lossless_dir.into(),
            lossless_pipes: RwLock::new(HashMap::new()),
        }
    }

    pub fn self_info(&self) -> &NodeInfo {
        &self.self_info
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    /// Declare that this node itself consumes `object_code` (spec §4.5 step
    /// 4 "dispatch locally if we consume the code").
    pub fn register_local_consumer(&self, object_code: impl Into<String>) {
        self.local_consumed.write().unwrap().insert(object_code.into());
    }

    pub fn self_consumes(&self, object_code: &str) -> bool {
        self.local_consumed.read().unwrap().contains(object_code)
    }

    /// Install a `filterDestination` for one `ObjectCode`.
    pub fn register_filter(&self, object_code: impl Into<String>, filter: std::sync::Arc<DestinationFilter>) {
        self.filters.write().unwrap().insert(object_code.into(), filter);
    }

    pub fn add_channel(&self, channel: std::sync::Arc<dyn Channel>, role: Role) -> ChannelId {
        let id = ChannelId(self.next_channel_id.fetch_add(1, Ordering::SeqCst));
        let label = format!("ch{}", id.0);
        let entry = ChannelEntry {
            channel,
            role,
            remote_uuid: Mutex::new(None),
            inbound: Sequencer::new(format!("{label}-in")),
            outbound: Sequencer::new(format!("{label}-out")),
        };
        self.channels.write().unwrap().insert(id, std::sync::Arc::new(entry));
        id
    }

    fn get_channel(&self, id: ChannelId) -> Result<std::sync::Arc<ChannelEntry>, HubError> {
        self.channels.read().unwrap().get(&id).cloned().ok_or(HubError::UnknownChannel(id))
    }

    pub fn channel_handle(&self, id: ChannelId) -> Result<std::sync::Arc<dyn Channel>, HubError> {
        Ok(self.get_channel(id)?.channel.clone())
    }

    /// Process a peer's `^L` login offer against the role this channel was
    /// registered with, and record the resulting `RemoteNode`.
    pub fn login(&self, channel_id: ChannelId, login: Login) -> Result<LoginAck, HubError> {
        let entry = self.get_channel(channel_id)?;
        if entry.role.conflicts_with(login.role) {
            return Err(HubError::RoleConflict(login.role));
        }

        let info = NodeInfo {
            uuid: login.uuid,
            name: login.name.clone(),
            version: login.version.clone(),
            core_version: login.core_version.clone(),
            remote_address: Some(entry.channel.remote_address()),
            user_label: login.user_label.clone(),
            app_params: HashMap::new(),
        };
        self.nodes.upsert(info);
        self.nodes.with_mut(login.uuid, |n| {
            n.connected = true;
            n.connected_since = now_centis();
            n.consumed = login
                .consumed
                .iter()
                .map(|c| ConsumedCode {
                    object_code: c.object_code.clone(),
                    mode: if c.lossless { DeliveryMode::Lossless } else { DeliveryMode::Modulo },
                })
                .collect();
        });
        *entry.remote_uuid.lock().unwrap() = Some(login.uuid);

        Ok(LoginAck {
            uuid: self.self_info.uuid,
            role: entry.role,
            name: self.self_info.name.clone(),
            version: self.self_info.version.clone(),
            core_version: self.self_info.core_version.clone(),
            user_label: self.self_info.user_label.clone(),
            consumed: vec![],
            accepted: true,
            refusal_reason: None,
        })
    }

    /// Process an inbound `^Reset` (spec §4.5 step 3): a newer deploy-time
    /// than anything previously seen from `requestor` clears its per-code
    /// sequence counters and pending-query set, the way a fresh deploy
    /// invalidates everything the mesh remembered about the old instance.
    pub fn handle_reset_request(&self, reset: &ResetRequest) {
        self.nodes.upsert(NodeInfo::new(reset.requestor, "", "", ""));
        self.nodes.with_mut(reset.requestor, |n| n.note_deploy_time(reset.deploy_time));
    }

    /// Cross-mesh per-`(origin, ObjectCode)` monotonic check (spec §4.5 step
    /// 2, spec §5): unlike the per-channel `Sequencer`, this tracks the
    /// producer's own `objSeq` end to end, so a frame that reaches this node
    /// by two different paths is only ever accepted once regardless of
    /// which channel it arrives on first.
    fn accepts_origin_seq(&self, origin: Uuid, object_code: &str, obj_seq: u32) -> bool {
        self.nodes.upsert(NodeInfo::new(origin, "", "", ""));
        self.nodes
            .with_mut(origin, |n| {
                let expected = n.next_expected_seq.get(object_code).copied();
                if let Some(expected) = expected {
                    if obj_seq < expected {
                        return false;
                    }
                }
                n.next_expected_seq.insert(object_code.to_string(), obj_seq.wrapping_add(1));
                true
            })
            .unwrap_or(true)
    }

    fn lossless_pipe_for(&self, object_code: &str, consumer: Uuid) -> Result<std::sync::Arc<LosslessPipe>, HubError> {
        let key = (object_code.to_string(), consumer);
        if let Some(pipe) = self.lossless_pipes.read().unwrap().get(&key) {
            return Ok(pipe.clone());
        }
        let mut pipes = self.lossless_pipes.write().unwrap();
        if let Some(pipe) = pipes.get(&key) {
            return Ok(pipe.clone());
        }
        let dir = self.lossless_dir.join(object_code).join(consumer.to_string());
        let pipe = std::sync::Arc::new(LosslessPipe::open(dir, PipeParams::default())?);
        pipes.insert(key, pipe.clone());
        Ok(pipe)
    }

    /// Sequence, locally dispatch, and forward one inbound frame (spec §4.5
    /// steps 1-7). `skip_forward` implements the query-reply shortcut: the
    /// caller sets it when this frame is a reply to a query this node
    /// itself originated.
    pub async fn route_inbound(&self, from: ChannelId, frame: Frame, skip_forward: bool, sink: &dyn LocalSink) -> Result<RouteOutcome, HubError> {
        if frame.origin == self.self_info.uuid {
            return Ok(RouteOutcome::Boomerang);
        }

        let entry = self.get_channel(from)?;
        let seq: u16 = frame.seq_token.parse().map_err(|_| HubError::BadSeqToken(frame.seq_token.clone()))?;

        match entry.inbound.on_receive(&frame.object_code, seq) {
            SeqOutcome::Duplicate => return Ok(RouteOutcome::Duplicate),
            SeqOutcome::OutOfSequence { reset_requested } => {
                return Ok(RouteOutcome::OutOfSequence { reset_requested })
            }
            SeqOutcome::InSequence | SeqOutcome::Reset => {}
        }

        if !self.accepts_origin_seq(frame.origin, &frame.object_code, frame.obj_seq) {
            return Ok(RouteOutcome::StaleOrigin);
        }

        let dispatched_locally = self.self_consumes(&frame.object_code);
        if dispatched_locally {
            sink.dispatch_local(&frame);
        }

        let mut forwarded = Vec::new();
        let mut lossless_queued = Vec::new();

        // A frame addressed to exactly one recipient who is currently
        // offline is still accepted for local dispatch above, but there is
        // nobody left to forward it to (spec §4.5 step 6).
        let single_offline_recipient = match frame.destinations.as_slice() {
            [only] => !self.nodes.with(*only, |n| n.connected).unwrap_or(false),
            _ => false,
        };

        if !skip_forward && !single_offline_recipient {
            let filter = self.filters.read().unwrap().get(&frame.object_code).cloned();
            let targets: Vec<(ChannelId, std::sync::Arc<ChannelEntry>)> =
                self.channels.read().unwrap().iter().filter(|(id, _)| **id != from).map(|(id, e)| (*id, e.clone())).collect();

            for (id, candidate) in targets {
                let Some(remote_uuid) = *candidate.remote_uuid.lock().unwrap() else { continue };
                let consumes = self.nodes.with(remote_uuid, |n| n.connected && n.consumes(&frame.object_code)).unwrap_or(false);
                if !consumes {
                    continue;
                }
                if !frame.destinations.is_empty() && !frame.destinations.contains(&remote_uuid) {
                    continue;
                }
                if let Some(filter) = &filter {
                    let passes = self.nodes.with(remote_uuid, |n| filter(n)).unwrap_or(false);
                    if !passes {
                        continue;
                    }
                }

                let delivery = self.nodes.with(remote_uuid, |n| n.delivery_mode(&frame.object_code)).flatten();
                if delivery == Some(DeliveryMode::Lossless) {
                    let pipe = self.lossless_pipe_for(&frame.object_code, remote_uuid)?;
                    let mut out = frame.clone();
                    out.ack_seq = Some(pipe.next_put());
                    pipe.put(&out.serialize())?;
                    lossless_queued.push(id);
                    continue;
                }

                let mut out = frame.clone();
                out.seq_token = candidate.outbound.on_send(&frame.object_code).to_string();
                candidate.channel.send(ChannelMessage::Data(out)).await?;
                forwarded.push(id);
            }
        }

        Ok(RouteOutcome::Delivered { dispatched_locally, forwarded, lossless_queued })
    }

    /// On channel disconnect (spec §4.5 "On channel disconnect"): drop the
    /// peer if it is unreachable via any other channel, and compute the
    /// object-codes it consumed that no remaining connected peer still
    /// needs.
    pub fn remove_channel(&self, id: ChannelId) -> DisconnectReport {
        let entry = self.channels.write().unwrap().remove(&id);
        let Some(entry) = entry else { return DisconnectReport::default() };
        let Some(remote_uuid) = *entry.remote_uuid.lock().unwrap() else { return DisconnectReport::default() };

        let reachable_elsewhere =
            self.channels.read().unwrap().values().any(|c| *c.remote_uuid.lock().unwrap() == Some(remote_uuid));
        if reachable_elsewhere {
            return DisconnectReport::default();
        }

        let consumed_codes: Vec<String> =
            self.nodes.with(remote_uuid, |n| n.consumed.iter().map(|c| c.object_code.clone()).collect()).unwrap_or_default();
        self.nodes.with_mut(remote_uuid, |n| n.connected = false);

        let orphaned: Vec<String> = consumed_codes.into_iter().filter(|code| self.nodes.consumers_of(code).is_empty()).collect();

        DisconnectReport { dropped_nodes: vec![remote_uuid], orphaned_codes: orphaned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_channel::{ConsumedCodeAnnounce, LoopbackChannel};
    use sw_wire::frame::{Prefix, SubHeader};

    fn sample_frame(code: &str, seq: u16) -> Frame {
        sample_frame_from(Uuid::nil(), code, seq, seq as u32)
    }

    fn sample_frame_from(origin: Uuid, code: &str, seq: u16, obj_seq: u32) -> Frame {
        Frame {
            prefix: Prefix::Data,
            object_code: code.to_string(),
            timestamp_token: "100".to_string(),
            seq_token: seq.to_string(),
            sub_header: SubHeader::Full,
            origin,
            destinations: vec![],
            obj_seq,
            ack_seq: None,
            keys: vec!["a".to_string()],
            value_tokens: vec!["x=1".to_string()],
        }
    }

    struct Recorder(Mutex<Vec<Frame>>);
    impl LocalSink for Recorder {
        fn dispatch_local(&self, frame: &Frame) {
            self.0.lock().unwrap().push(frame.clone());
        }
    }

    fn login_for(role: Role, codes: &[&str]) -> Login {
        Login {
            uuid: Uuid::new_v4(),
            role,
            name: "peer".into(),
            version: "1".into(),
            core_version: "1".into(),
            user_label: None,
            consumed: codes.iter().map(|c| ConsumedCodeAnnounce { object_code: c.to_string(), lossless: false }).collect(),
        }
    }

    #[test]
    fn login_refuses_matching_single_role() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-refuse"));
        let id = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Producer);
        let err = hub.login(id, login_for(Role::Producer, &[])).unwrap_err();
        assert!(matches!(err, HubError::RoleConflict(Role::Producer)));
    }

    #[tokio::test]
    async fn duplicate_frame_is_dropped() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-dup"));
        let id = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Consumer);
        let sink = Recorder(Mutex::new(Vec::new()));
        hub.route_inbound(id, sample_frame("Car", 0), true, &sink).await.unwrap();
        hub.route_inbound(id, sample_frame("Car", 1), true, &sink).await.unwrap();
        let outcome = hub.route_inbound(id, sample_frame("Car", 0), true, &sink).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Duplicate));
    }

    #[tokio::test]
    async fn consumed_code_dispatches_locally() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-local"));
        hub.register_local_consumer("Car");
        let id = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Producer);
        let sink = Recorder(Mutex::new(Vec::new()));
        let outcome = hub.route_inbound(id, sample_frame("Car", 0), true, &sink).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Delivered { dispatched_locally: true, .. }));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn frame_forwards_to_consuming_channel_but_not_origin() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-fwd"));
        let (producer_end, _producer_remote) = LoopbackChannel::pair(8, "producer", "hub");
        let producer_id = hub.add_channel(std::sync::Arc::new(producer_end), Role::Producer);

        let (hub_side, consumer_side) = LoopbackChannel::pair(8, "hub", "consumer");
        let consumer_id = hub.add_channel(std::sync::Arc::new(hub_side), Role::Consumer);
        hub.login(consumer_id, login_for(Role::Consumer, &["Car"])).unwrap();

        let sink = Recorder(Mutex::new(Vec::new()));
        let outcome = hub.route_inbound(producer_id, sample_frame("Car", 0), false, &sink).await.unwrap();
        match outcome {
            RouteOutcome::Delivered { forwarded, .. } => assert_eq!(forwarded, vec![consumer_id]),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match consumer_side.recv().await.unwrap() {
            ChannelMessage::Data(frame) => assert_eq!(frame.object_code, "Car"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn lossless_consumer_is_queued_not_sent_directly() {
        let dir = std::env::temp_dir().join(format!("sw-hub-test-lossless-{}", Uuid::new_v4()));
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), dir);
        let (producer_end, _) = LoopbackChannel::pair(8, "producer", "hub");
        let producer_id = hub.add_channel(std::sync::Arc::new(producer_end), Role::Producer);

        let (hub_side, consumer_side) = LoopbackChannel::pair(8, "hub", "consumer");
        let consumer_id = hub.add_channel(std::sync::Arc::new(hub_side), Role::Consumer);
        let mut login = login_for(Role::Consumer, &[]);
        login.consumed.push(ConsumedCodeAnnounce { object_code: "Car".into(), lossless: true });
        hub.login(consumer_id, login).unwrap();

        let sink = Recorder(Mutex::new(Vec::new()));
        let outcome = hub.route_inbound(producer_id, sample_frame("Car", 0), false, &sink).await.unwrap();
        match outcome {
            RouteOutcome::Delivered { lossless_queued, forwarded, .. } => {
                assert_eq!(lossless_queued, vec![consumer_id]);
                assert!(forwarded.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let consumer_uuid = hub.get_channel(consumer_id).unwrap().remote_uuid.lock().unwrap().unwrap();
        let stored = hub.lossless_pipe_for("Car", consumer_uuid).unwrap();
        let queued = Frame::parse(&stored.get().unwrap().unwrap()).unwrap();
        assert_eq!(queued.ack_seq, Some(0));
        consumer_side.close().await;
    }

    #[tokio::test]
    async fn boomerang_frame_is_dropped_before_dispatch_or_forward() {
        let self_uuid = Uuid::new_v4();
        let hub = Hub::new(NodeInfo::new(self_uuid, "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-boomerang"));
        hub.register_local_consumer("Car");
        let id = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Producer);
        let sink = Recorder(Mutex::new(Vec::new()));

        let outcome = hub.route_inbound(id, sample_frame_from(self_uuid, "Car", 0, 0), true, &sink).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Boomerang));
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_origin_sequence_is_dropped() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-stale-origin"));
        hub.register_local_consumer("Car");
        let id = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Producer);
        let sink = Recorder(Mutex::new(Vec::new()));
        let origin = Uuid::new_v4();

        hub.route_inbound(id, sample_frame_from(origin, "Car", 0, 5), true, &sink).await.unwrap();
        // A frame claiming an earlier application sequence than one this
        // node already accepted from the same origin+code must be dropped,
        // even though its link-level seq is in order.
        let outcome = hub.route_inbound(id, sample_frame_from(origin, "Car", 1, 2), true, &sink).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::StaleOrigin));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn single_offline_destination_is_accepted_locally_but_not_forwarded() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-offline-dest"));
        hub.register_local_consumer("Car");
        let (producer_end, _) = LoopbackChannel::pair(8, "producer", "hub");
        let producer_id = hub.add_channel(std::sync::Arc::new(producer_end), Role::Producer);

        let (hub_side, _consumer_side) = LoopbackChannel::pair(8, "hub", "consumer");
        let consumer_id = hub.add_channel(std::sync::Arc::new(hub_side), Role::Consumer);
        hub.login(consumer_id, login_for(Role::Consumer, &["Car"])).unwrap();
        let consumer_uuid = hub.get_channel(consumer_id).unwrap().remote_uuid.lock().unwrap().unwrap();
        hub.nodes().with_mut(consumer_uuid, |n| n.connected = false);

        let mut frame = sample_frame("Car", 0);
        frame.destinations = vec![consumer_uuid];
        let sink = Recorder(Mutex::new(Vec::new()));
        let outcome = hub.route_inbound(producer_id, frame, false, &sink).await.unwrap();
        match outcome {
            RouteOutcome::Delivered { dispatched_locally, forwarded, lossless_queued } => {
                assert!(dispatched_locally);
                assert!(forwarded.is_empty());
                assert!(lossless_queued.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn disconnect_drops_node_and_reports_orphaned_codes() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-disc"));
        let id = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Consumer);
        hub.login(id, login_for(Role::Consumer, &["Car"])).unwrap();

        let report = hub.remove_channel(id);
        assert_eq!(report.dropped_nodes.len(), 1);
        assert_eq!(report.orphaned_codes, vec!["Car".to_string()]);
    }

    #[test]
    fn disconnect_does_not_drop_node_reachable_via_another_channel() {
        let hub = Hub::new(NodeInfo::new(Uuid::new_v4(), "self", "1", "1"), std::env::temp_dir().join("sw-hub-test-multi"));
        let login = login_for(Role::Consumer, &["Car"]);
        let id1 = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Consumer);
        hub.login(id1, login.clone()).unwrap();
        let id2 = hub.add_channel(std::sync::Arc::new(LoopbackChannel::pair(4, "a", "b").0), Role::Consumer);
        hub.login(id2, login).unwrap();

        let report = hub.remove_channel(id1);
        assert!(report.dropped_nodes.is_empty());
    }
}
