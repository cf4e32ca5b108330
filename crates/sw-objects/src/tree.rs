//! The data-object tree (spec §4.1).
//!
//! Objects live in an arena keyed by an opaque [`NodeId`] handle (spec §9:
//! arena/weak handles instead of cyclic parent/child references). Sibling
//! uniqueness is enforced per `(parent NodeId, ObjectCode)` bucket, each
//! guarded by its own `RwLock` so a reader walking one branch never
//! contends with a writer committing to an unrelated one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use sw_wire::Value;
use uuid::Uuid;

use crate::error::TreeError;
use crate::object::{normalize_id, now_centis, DataObject, ObjectMeta};
use crate::registry::Registry;

/// Opaque handle to a stored object. `ROOT` addresses the tree's sentinel
/// and is never a real arena entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

struct StoredObject {
    object_code: &'static str,
    /// Raw (non-normalized) id, kept for display and wire encoding.
    raw_id: String,
    parent: NodeId,
    meta: ObjectMeta,
    obj: Box<dyn DataObject>,
    removed: bool,
    rename_target: Option<String>,
}

impl StoredObject {
    fn obsolete(&self) -> bool {
        self.removed || self.rename_target.is_some()
    }
}

type Bucket = RwLock<HashMap<String, NodeId>>;

/// The object tree. One instance per running node.
pub struct Tree {
    registry: Registry,
    arena: RwLock<HashMap<NodeId, StoredObject>>,
    buckets: RwLock<HashMap<(NodeId, &'static str), Bucket>>,
    next_id: AtomicU64,
    self_origin: Uuid,
    next_seq: RwLock<HashMap<&'static str, u32>>,
}

impl Tree {
    pub fn new(registry: Registry, self_origin: Uuid) -> Self {
        Tree {
            registry,
            arena: RwLock::new(HashMap::new()),
            buckets: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            self_origin,
            next_seq: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn alloc_id(&self) -> NodeId {
        NodeId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn next_object_seq(&self, code: &'static str) -> u32 {
        let mut seqs = self.next_seq.write().unwrap();
        let entry = seqs.entry(code).or_insert(0);
        let seq = *entry;
        *entry = entry.wrapping_add(1);
        seq
    }

    fn parent_code_of(&self, parent: NodeId) -> Result<Option<&'static str>, TreeError> {
        if parent == NodeId::ROOT {
            return Ok(None);
        }
        let arena = self.arena.read().unwrap();
        arena.get(&parent).map(|n| Some(n.object_code)).ok_or(TreeError::NotFound)
    }

    /// `root.createChild(type, id)` — top-level convenience (spec §4.1).
    pub fn create_top_level_object(&self, code: &str, id: &str) -> Result<NodeId, TreeError> {
        self.create_child(NodeId::ROOT, code, id)
    }

    /// Create a child of `parent` with the registered type for `code`.
    /// Enforces that the type's declared parent code matches `parent`'s
    /// actual code, and that `(code, normalized id)` is free among
    /// `parent`'s siblings (or occupied only by an obsolete object).
    pub fn create_child(&self, parent: NodeId, code: &str, id: &str) -> Result<NodeId, TreeError> {
        let obj = self
            .registry
            .create(code)
            .ok_or_else(|| TreeError::FactoryMiss(code.to_owned()))?;

        let actual_parent_code = self.parent_code_of(parent)?;
        let declared = obj.parent_code();
        if declared != actual_parent_code {
            return Err(TreeError::ParentMismatch {
                expected: declared.map(str::to_owned),
                actual: actual_parent_code.map(str::to_owned),
            });
        }

        let object_code = obj.object_code();
        let normalized = normalize_id(id, obj.is_case_sensitive_id());

        let bucket_key = (parent, object_code);
        {
            let buckets = self.buckets.read().unwrap();
            if let Some(bucket) = buckets.get(&bucket_key) {
                let guard = bucket.read().unwrap();
                if let Some(existing) = guard.get(&normalized) {
                    let arena = self.arena.read().unwrap();
                    if arena.get(existing).is_some_and(|n| !n.obsolete()) {
                        return Err(TreeError::DuplicateId {
                            object_code: object_code.to_owned(),
                            id: id.to_owned(),
                        });
                    }
                }
            }
        }

        let node_id = self.alloc_id();
        let seq = self.next_object_seq(object_code);
        let stored = StoredObject {
            object_code,
            raw_id: id.to_owned(),
            parent,
            meta: ObjectMeta::new(self.self_origin, seq, now_centis()),
            obj,
            removed: false,
            rename_target: None,
        };

        self.arena.write().unwrap().insert(node_id, stored);
        {
            let mut buckets = self.buckets.write().unwrap();
            let bucket = buckets.entry(bucket_key).or_insert_with(|| RwLock::new(HashMap::new()));
            bucket.write().unwrap().insert(normalized, node_id);
        }

        Ok(node_id)
    }

    /// Resolve the full root-down key path for a node.
    pub fn key_path(&self, id: NodeId) -> Result<Vec<String>, TreeError> {
        let arena = self.arena.read().unwrap();
        let mut path = Vec::new();
        let mut cur = id;
        loop {
            let node = arena.get(&cur).ok_or(TreeError::NotFound)?;
            path.push(node.raw_id.clone());
            if node.parent == NodeId::ROOT {
                break;
            }
            cur = node.parent;
        }
        path.reverse();
        Ok(path)
    }

    pub fn object_code_of(&self, id: NodeId) -> Option<&'static str> {
        self.arena.read().unwrap().get(&id).map(|n| n.object_code)
    }

    pub fn is_obsolete(&self, id: NodeId) -> bool {
        self.arena.read().unwrap().get(&id).is_some_and(StoredObject::obsolete)
    }

    pub fn meta(&self, id: NodeId) -> Option<ObjectMeta> {
        self.arena.read().unwrap().get(&id).map(|n| n.meta.clone())
    }

    /// Read the object's declared fields. Returns `None` if the node is
    /// unknown (already evicted).
    pub fn fields(&self, id: NodeId) -> Option<Vec<(String, Value)>> {
        self.arena.read().unwrap().get(&id).map(|n| n.obj.fields())
    }

    /// Apply decoded field values to the stored object and bump its
    /// timestamp/sequence, as a producer mutation followed by commit would.
    pub fn apply_fields(&self, id: NodeId, fields: Vec<(String, Value)>) -> Result<(), TreeError> {
        let mut arena = self.arena.write().unwrap();
        let node = arena.get_mut(&id).ok_or(TreeError::NotFound)?;
        node.obj.apply_fields(fields);
        node.meta.timestamp = now_centis();
        Ok(())
    }

    /// `remove()` — marks the object obsolete; it remains in the arena
    /// until [`Tree::evict`] is called once propagation has completed.
    pub fn remove(&self, id: NodeId) -> Result<(), TreeError> {
        let mut arena = self.arena.write().unwrap();
        let node = arena.get_mut(&id).ok_or(TreeError::NotFound)?;
        node.removed = true;
        Ok(())
    }

    /// Atomically rename `id` to `new_raw_id`. Returns `(obsolete_sentinel,
    /// live_successor)`: the sentinel carries the old id and the rename
    /// target for the caller to propagate; the successor is the live node
    /// under the new id that future mutations should target (spec §4.1).
    pub fn rename(&self, id: NodeId, new_raw_id: &str) -> Result<(NodeId, NodeId), TreeError> {
        let (parent, object_code, case_sensitive, old_normalized) = {
            let arena = self.arena.read().unwrap();
            let node = arena.get(&id).ok_or(TreeError::NotFound)?;
            (
                node.parent,
                node.object_code,
                node.obj.is_case_sensitive_id(),
                normalize_id(&node.raw_id, node.obj.is_case_sensitive_id()),
            )
        };
        let new_normalized = normalize_id(new_raw_id, case_sensitive);

        let bucket_key = (parent, object_code);
        let mut buckets = self.buckets.write().unwrap();
        let bucket = buckets.entry(bucket_key).or_insert_with(|| RwLock::new(HashMap::new()));
        let mut guard = bucket.write().unwrap();

        if let Some(existing) = guard.get(&new_normalized) {
            let arena = self.arena.read().unwrap();
            if arena.get(existing).is_some_and(|n| !n.obsolete()) {
                return Err(TreeError::RenameConflict {
                    object_code: object_code.to_owned(),
                    new_id: new_raw_id.to_owned(),
                });
            }
        }

        let mut arena = self.arena.write().unwrap();
        let successor_obj = {
            let node = arena.get(&id).ok_or(TreeError::NotFound)?;
            node.obj.clone_box()
        };
        let seq = {
            drop(arena);
            let s = self.next_object_seq(object_code);
            arena = self.arena.write().unwrap();
            s
        };
        let successor_id = self.alloc_id();
        arena.insert(
            successor_id,
            StoredObject {
                object_code,
                raw_id: new_raw_id.to_owned(),
                parent,
                meta: ObjectMeta::new(self.self_origin, seq, now_centis()),
                obj: successor_obj,
                removed: false,
                rename_target: None,
            },
        );

        let sentinel = arena.get_mut(&id).ok_or(TreeError::NotFound)?;
        sentinel.rename_target = Some(new_raw_id.to_owned());

        guard.remove(&old_normalized);
        guard.insert(new_normalized, successor_id);

        Ok((id, successor_id))
    }

    /// Permanently drop a node once it has been fully delivered (or was
    /// never shared). No-op if already gone.
    pub fn evict(&self, id: NodeId) {
        self.arena.write().unwrap().remove(&id);
    }

    /// Depth-first search for descendants of `parent` matching `object_code`
    /// (or every type, if `None`) and `predicate`, skipping obsolete nodes.
    /// If `parent` has a direct-child bucket for `object_code`, only that
    /// bucket is tested (spec §4.1's fast path); otherwise every bucket
    /// rooted at `parent` is tested and recursed into.
    pub fn get_filtered_children(
        &self,
        parent: NodeId,
        object_code: Option<&str>,
        predicate: &mut dyn FnMut(&dyn DataObject) -> bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_filtered(parent, object_code, predicate, &mut out);
        out
    }

    fn collect_filtered(
        &self,
        parent: NodeId,
        object_code: Option<&str>,
        predicate: &mut dyn FnMut(&dyn DataObject) -> bool,
        out: &mut Vec<NodeId>,
    ) {
        if let Some(code) = object_code {
            let direct: Option<&'static str> = {
                let buckets = self.buckets.read().unwrap();
                buckets.keys().find(|(p, c)| *p == parent && *c == code).map(|(_, c)| *c)
            };
            if let Some(static_code) = direct {
                self.test_bucket(parent, static_code, object_code, predicate, out);
                return;
            }
        }

        let bucket_codes: Vec<&'static str> = {
            let buckets = self.buckets.read().unwrap();
            buckets.keys().filter(|(p, _)| *p == parent).map(|(_, c)| *c).collect()
        };
        for code in bucket_codes {
            if object_code.is_none() || object_code == Some(code) {
                self.test_bucket(parent, code, object_code, predicate, out);
            } else {
                // Recurse without testing: the requested code might nest deeper.
                self.recurse_bucket_children(parent, code, object_code, predicate, out);
            }
        }
    }

    fn test_bucket(
        &self,
        parent: NodeId,
        code: &'static str,
        object_code: Option<&str>,
        predicate: &mut dyn FnMut(&dyn DataObject) -> bool,
        out: &mut Vec<NodeId>,
    ) {
        let child_ids: Vec<NodeId> = {
            let buckets = self.buckets.read().unwrap();
            match buckets.get(&(parent, code)) {
                Some(bucket) => bucket.read().unwrap().values().copied().collect(),
                None => return,
            }
        };
        for child in child_ids {
            let matched = {
                let arena = self.arena.read().unwrap();
                match arena.get(&child) {
                    Some(node) if !node.obsolete() => predicate(node.obj.as_ref()),
                    _ => false,
                }
            };
            if matched {
                out.push(child);
            }
            // Only a caller searching every type (`None`) should keep
            // descending past a match; a code-scoped search stops at the
            // direct bucket so unrelated nested types are never collected.
            if object_code.is_none() {
                self.collect_filtered(child, None, predicate, out);
            }
        }
    }

    fn recurse_bucket_children(
        &self,
        parent: NodeId,
        code: &'static str,
        object_code: Option<&str>,
        predicate: &mut dyn FnMut(&dyn DataObject) -> bool,
        out: &mut Vec<NodeId>,
    ) {
        let child_ids: Vec<NodeId> = {
            let buckets = self.buckets.read().unwrap();
            match buckets.get(&(parent, code)) {
                Some(bucket) => bucket.read().unwrap().values().copied().collect(),
                None => return,
            }
        };
        for child in child_ids {
            let live = self.arena.read().unwrap().get(&child).is_some_and(|n| !n.obsolete());
            if live {
                self.collect_filtered(child, object_code, predicate, out);
            }
        }
    }

    /// Cheap introspection: live (non-obsolete) object counts per code.
    /// Used by tests and the demo binary's startup log line.
    pub fn stats(&self) -> HashMap<&'static str, usize> {
        let arena = self.arena.read().unwrap();
        let mut counts = HashMap::new();
        for node in arena.values().filter(|n| !n.obsolete()) {
            *counts.entry(node.object_code).or_insert(0) += 1;
        }
        counts
    }
}
