//! The mesh hub (spec §4.5): node table, per-channel sequencing, local
//! dispatch, and filtered fan-out, including the lossless-vs-modulo
//! delivery decision and disconnect bookkeeping.

pub mod error;
pub mod hub;
pub mod node_table;

pub use error::HubError;
pub use hub::{ChannelId, DestinationFilter, DisconnectReport, Hub, LocalSink, RouteOutcome};
pub use node_table::NodeTable;
