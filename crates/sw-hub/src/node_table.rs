//! The hub's view of every peer it has ever logged in, independent of which
//! channel(s) currently reach them.

use std::collections::HashMap;
use std::sync::RwLock;

use sw_objects::{NodeInfo, RemoteNode};
use uuid::Uuid;

pub struct NodeTable {
    nodes: RwLock<HashMap<Uuid, RemoteNode>>,
}

impl NodeTable {
    pub fn new() -> Self {
        NodeTable { nodes: RwLock::new(HashMap::new()) }
    }

    /// Look up or create the bookkeeping record for `info.uuid`.
    pub fn upsert(&self, info: NodeInfo) -> Uuid {
        let uuid = info.uuid;
        let mut nodes = self.nodes.write().unwrap();
        nodes.entry(uuid).or_insert_with(|| RemoteNode::new(info));
        uuid
    }

    pub fn with_mut<R>(&self, uuid: Uuid, f: impl FnOnce(&mut RemoteNode) -> R) -> Option<R> {
        let mut nodes = self.nodes.write().unwrap();
        nodes.get_mut(&uuid).map(f)
    }

    pub fn with<R>(&self, uuid: Uuid, f: impl FnOnce(&RemoteNode) -> R) -> Option<R> {
        let nodes = self.nodes.read().unwrap();
        nodes.get(&uuid).map(f)
    }

    pub fn connected_uuids(&self) -> Vec<Uuid> {
        self.nodes.read().unwrap().iter().filter(|(_, n)| n.connected).map(|(id, _)| *id).collect()
    }

    pub fn consumers_of(&self, object_code: &str) -> Vec<Uuid> {
        self.nodes
            .read()
            .unwrap()
            .iter()
            .filter(|(_, n)| n.connected && n.consumes(object_code))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn remove(&self, uuid: Uuid) -> Option<RemoteNode> {
        self.nodes.write().unwrap().remove(&uuid)
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.nodes.read().unwrap().contains_key(&uuid)
    }
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_objects::{ConsumedCode, DeliveryMode};

    fn info(name: &str) -> NodeInfo {
        NodeInfo::new(Uuid::new_v4(), name, "1.0", "1.0")
    }

    #[test]
    fn upsert_is_idempotent() {
        let table = NodeTable::new();
        let info = info("peer");
        let uuid = info.uuid;
        table.upsert(info.clone());
        table.upsert(info);
        table.with_mut(uuid, |n| n.connected = true);
        assert_eq!(table.connected_uuids(), vec![uuid]);
    }

    #[test]
    fn consumers_of_filters_by_connection_and_code() {
        let table = NodeTable::new();
        let a = info("a");
        let a_id = a.uuid;
        table.upsert(a);
        table.with_mut(a_id, |n| {
            n.connected = true;
            n.consumed.push(ConsumedCode { object_code: "Car".into(), mode: DeliveryMode::Modulo });
        });
        let b = info("b");
        let b_id = b.uuid;
        table.upsert(b);
        table.with_mut(b_id, |n| n.connected = true);

        assert_eq!(table.consumers_of("Car"), vec![a_id]);
        assert!(table.consumers_of("Driver").is_empty());
    }
}
