//! Data-object tree, factory registry, and node/remote-node records for the
//! spiderwiz object-propagation fabric (spec §3, §4.1).

pub mod error;
pub mod node;
pub mod object;
pub mod registry;
pub mod tree;

pub use error::TreeError;
pub use node::{ConsumedCode, DeliveryMode, NodeInfo, RemoteNode};
pub use object::{normalize_id, now_centis, DataObject, ObjectMeta};
pub use registry::Registry;
pub use tree::{NodeId, Tree};
