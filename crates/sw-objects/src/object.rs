//! The `DataObject` trait and the runtime metadata every stored instance
//! carries alongside it (spec §3 "Data object").

use sw_wire::Value;
use uuid::Uuid;

/// A serializable, tree-addressable object. Applications implement this for
/// each concrete type and register a factory for it (spec §9: registration
/// instead of reflection).
pub trait DataObject: Send + Sync + std::fmt::Debug {
    /// The constant `ObjectCode` for this type. Never contains a comma.
    fn object_code(&self) -> &'static str;

    /// The `ObjectCode` this type must be created under, or `None` for a
    /// top-level type.
    fn parent_code(&self) -> Option<&'static str>;

    /// Not stored in the tree; discarded immediately after dispatch.
    fn is_disposable(&self) -> bool {
        false
    }

    /// Whether this type's id is compared case-sensitively.
    fn is_case_sensitive_id(&self) -> bool {
        true
    }

    /// Suppresses forwarding to other nodes; dispatched locally only.
    fn is_only_for_me(&self) -> bool {
        false
    }

    /// Declared serializable fields, in stable (append-only) order.
    fn fields(&self) -> Vec<(String, Value)>;

    /// Apply decoded field values (full or already-delta-resolved) back onto
    /// the object, in the same order `fields()` declares them.
    fn apply_fields(&mut self, fields: Vec<(String, Value)>);

    /// A fresh, empty instance of the same concrete type. Used by `rename`
    /// to materialize the live successor without requiring `Clone` on the
    /// trait object.
    fn clone_box(&self) -> Box<dyn DataObject>;
}

/// Normalize an id for storage/lookup, per spec §3: "normalized to
/// lowercase when the type is case-insensitive; applied consistently on
/// store, lookup, rename, and wire encoding."
pub fn normalize_id(id: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        id.to_owned()
    } else {
        id.to_lowercase()
    }
}

/// Runtime metadata attached to every stored object, separate from the
/// object's own declared fields (spec §3 "Runtime metadata").
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub origin: Uuid,
    /// Per-(origin, ObjectCode) sequence number, assigned by the producer.
    pub object_seq: u32,
    /// Centisecond epoch timestamp.
    pub timestamp: i64,
    /// Raw inbound wire line, kept for debugging when parsed from a peer.
    pub raw: Option<String>,
    pub user_label: Option<String>,
}

impl ObjectMeta {
    pub fn new(origin: Uuid, object_seq: u32, timestamp: i64) -> Self {
        ObjectMeta {
            origin,
            object_seq,
            timestamp,
            raw: None,
            user_label: None,
        }
    }
}

/// Current time as centiseconds since the Unix epoch, the unit the wire
/// format's timestamp field uses (spec §4.2).
pub fn now_centis() -> i64 {
    chrono::Utc::now().timestamp_millis() / 10
}
